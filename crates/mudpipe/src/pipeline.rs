//! 管線驅動器
//!
//! 把一次socket讀取依序餵過 解碼器 → 行組裝器 → 腳本掛鉤 →
//! 回捲緩衝區，並把每條完成的行重新發佈為事件。
//! 整條流水線在單一讀取任務內同步執行，行依網路到達順序入庫

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::ansi::LineAssembler;
use crate::buffer::ScrollbackBuffer;
use crate::encoding::Charset;
use crate::event::PipelineEvent;
use crate::hooks::{NoopHooks, ScriptHooks};
use crate::line::Line;
use crate::logger::{LogFormat, Logger};
use crate::telnet::client::{TelnetClient, TelnetConfig, Transport};
use crate::telnet::decoder::DecodeOutput;
use crate::telnet::protocol::TelnetEvent;
use crate::telnet::TelnetError;

/// 管線配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 回捲緩衝區容量
    pub scrollback_lines: usize,
    /// 連線字元編碼
    pub charset: Charset,
    /// 日誌格式
    pub log_format: LogFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scrollback_lines: 1000,
            charset: Charset::default(),
            log_format: LogFormat::default(),
        }
    }
}

/// 控制命令（由 UI / 腳本層送入）
#[derive(Debug, Clone)]
pub enum PipelineCommand {
    /// 發送一行使用者輸入
    SendInput(String),
    /// 清空緩衝區並重置顏色攜帶狀態
    Clear,
    /// 開始記錄到檔案
    StartLog(PathBuf),
    /// 停止記錄
    StopLog,
    /// 結束管線
    Shutdown,
}

/// 管線驅動器
///
/// 解碼器與組裝器的狀態只屬於讀取任務；
/// 唯一跨任務共享的結構是回捲緩衝區
pub struct Pipeline {
    client: TelnetClient,
    assembler: LineAssembler,
    buffer: Arc<ScrollbackBuffer>,
    hooks: Box<dyn ScriptHooks>,
    logger: Logger,
    events_tx: mpsc::Sender<PipelineEvent>,
}

impl Pipeline {
    /// 創建新的管線
    pub fn new(config: PipelineConfig, events_tx: mpsc::Sender<PipelineEvent>) -> Self {
        Self {
            client: TelnetClient::new(TelnetConfig::default(), config.charset),
            assembler: LineAssembler::new(config.charset),
            buffer: Arc::new(ScrollbackBuffer::new(config.scrollback_lines)),
            hooks: Box::new(NoopHooks),
            logger: Logger::new(config.log_format),
            events_tx,
        }
    }

    /// 注入腳本掛鉤
    pub fn with_hooks(mut self, hooks: Box<dyn ScriptHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// 共享的回捲緩衝區（渲染層、腳本層讀取用）
    pub fn buffer(&self) -> Arc<ScrollbackBuffer> {
        Arc::clone(&self.buffer)
    }

    /// Telnet 客戶端（連線前調整配置、選項支援）
    pub fn client_mut(&mut self) -> &mut TelnetClient {
        &mut self.client
    }

    /// 連線到 MUD 伺服器
    pub async fn connect(&mut self, host: &str, port: u16) -> Result<(), TelnetError> {
        self.client.connect(host, port).await?;
        self.assembler.reset();
        let _ = self.events_tx.send(PipelineEvent::Connected).await;
        Ok(())
    }

    /// 接上已建立的傳輸
    pub fn attach(&mut self, stream: impl Transport + 'static) {
        self.client.attach(stream);
        self.assembler.reset();
    }

    /// 讀取迴圈
    ///
    /// 消耗管線本身；在傳輸結束或收到 Shutdown 時返回。
    /// 結束前強制完成未換行的尾端並發佈 Disconnected
    pub async fn run(mut self, mut commands: mpsc::Receiver<PipelineCommand>) {
        loop {
            tokio::select! {
                result = self.client.read() => {
                    match result {
                        Ok(output) => {
                            if !self.handle_output(output).await {
                                break;
                            }
                        }
                        Err(TelnetError::Disconnected) => {
                            info!("伺服器關閉連線");
                            break;
                        }
                        Err(e) => {
                            error!("讀取錯誤: {}", e);
                            break;
                        }
                    }
                }
                cmd = commands.recv() => {
                    match cmd {
                        Some(cmd) => {
                            if !self.handle_command(cmd).await {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
        }

        self.finish().await;
    }

    /// 處理一次讀取的解碼結果；接收端關閉時回傳 false
    async fn handle_output(&mut self, output: DecodeOutput) -> bool {
        if !output.replies.is_empty() {
            if let Err(e) = self.client.send_raw(&output.replies).await {
                warn!("協商回應發送失敗: {}", e);
            }
        }

        for event in output.events {
            let event = match event {
                TelnetEvent::Command(command, option) => {
                    PipelineEvent::Negotiation { command, option }
                }
                TelnetEvent::Subnegotiation(option, data) => {
                    PipelineEvent::Subnegotiation { option, data }
                }
            };
            if !self.emit(event).await {
                return false;
            }
        }

        let (lines, prompt) = self.assembler.feed(&output.data);

        for line in lines {
            if !self.publish_line(line).await {
                return false;
            }
        }

        if let Some(prompt) = prompt {
            let prompt = self.hooks.process_output(prompt);
            self.buffer.write(prompt.clone());
            if !self.emit(PipelineEvent::Prompt(prompt)).await {
                return false;
            }
        }

        true
    }

    /// 處理一條控制命令；收到 Shutdown 時回傳 false
    async fn handle_command(&mut self, cmd: PipelineCommand) -> bool {
        match cmd {
            PipelineCommand::SendInput(text) => {
                let line = self.hooks.process_input(Line::new(text));
                if let Err(e) = self.client.send(&line.raw).await {
                    warn!("輸入發送失敗: {}", e);
                }
                self.buffer.input_sent();
            }
            PipelineCommand::Clear => {
                self.buffer.clear();
                self.assembler.reset();
            }
            PipelineCommand::StartLog(path) => {
                if let Err(e) = self.logger.start(&path) {
                    warn!("無法開啟日誌 {:?}: {}", path, e);
                }
            }
            PipelineCommand::StopLog => {
                if let Err(e) = self.logger.stop() {
                    warn!("日誌關閉失敗: {}", e);
                }
            }
            PipelineCommand::Shutdown => {
                info!("收到關閉信號");
                return false;
            }
        }
        true
    }

    /// 掛鉤 → 日誌 → 入庫 → 發佈
    async fn publish_line(&mut self, line: Line) -> bool {
        let line = self.hooks.process_output(line);
        if let Err(e) = self.logger.log_line(&line) {
            warn!("日誌寫入失敗: {}", e);
        }
        self.buffer.write(line.clone());
        self.emit(PipelineEvent::Line(line)).await
    }

    async fn emit(&mut self, event: PipelineEvent) -> bool {
        if self.events_tx.send(event).await.is_err() {
            warn!("事件接收端已關閉");
            return false;
        }
        true
    }

    /// 收尾：強制完成尾端、發佈 Disconnected、斷線
    async fn finish(&mut self) {
        if let Some(line) = self.assembler.flush() {
            // 尾端移入主序列，提示欄位不再保留同一內容
            self.buffer.input_sent();
            let _ = self.publish_line(line).await;
        }
        let _ = self.events_tx.send(PipelineEvent::Disconnected).await;
        let _ = self.logger.flush();
        self.client.disconnect().await;
    }
}
