//! Telnet 客戶端
//!
//! 非同步 Telnet 連線管理：傳輸層抽象、連線建立、
//! 讀取與解碼、送出編碼

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info};

use super::decoder::{DecodeOutput, TelnetDecoder};
use super::protocol::{escape_iac, TelnetOption};
use crate::debug_log::DebugLogger;
use crate::encoding::Charset;

/// 雙工位元組通道
///
/// 明文 TCP 與加密傳輸都收斂為這一個能力，
/// 解碼器不感知底下的傳輸方式
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Transport for T {}

/// Telnet 客戶端錯誤
#[derive(Debug, Error)]
pub enum TelnetError {
    #[error("連線失敗: {0}")]
    ConnectionFailed(#[from] io::Error),

    #[error("連線逾時")]
    Timeout,

    #[error("未連線")]
    NotConnected,

    #[error("連線已關閉")]
    Disconnected,

    #[error("DNS 解析失敗: {0}")]
    DnsResolutionFailed(String),
}

/// 連線狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Telnet 客戶端配置
#[derive(Debug, Clone)]
pub struct TelnetConfig {
    /// 連線逾時
    pub connect_timeout: Duration,
    /// 讀取緩衝區大小
    pub read_buffer_size: usize,
}

impl Default for TelnetConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_buffer_size: 8192,
        }
    }
}

/// Telnet 客戶端
///
/// 解碼器隨連線建立而重建；部分命令狀態隨連線結束一併丟棄
pub struct TelnetClient {
    stream: Option<Box<dyn Transport>>,
    config: TelnetConfig,
    state: ConnectionState,
    decoder: TelnetDecoder,
    charset: Charset,
    /// 除了預設集合外，額外宣告支援的選項（跨連線保留）
    supported_options: Vec<TelnetOption>,
}

impl TelnetClient {
    /// 創建新的 Telnet 客戶端
    pub fn new(config: TelnetConfig, charset: Charset) -> Self {
        Self {
            stream: None,
            config,
            state: ConnectionState::Disconnected,
            decoder: TelnetDecoder::new(),
            charset,
            supported_options: Vec::new(),
        }
    }

    /// 獲取連線狀態
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// 宣告支援某選項；套用於之後建立的每條連線
    pub fn support_option(&mut self, option: TelnetOption) {
        if !self.supported_options.contains(&option) {
            self.supported_options.push(option);
        }
        self.decoder.set_supported(option, true);
    }

    /// 協定解碼器（查詢選項協商狀態）
    pub fn decoder(&self) -> &TelnetDecoder {
        &self.decoder
    }

    /// 連線到 MUD 伺服器
    ///
    /// # Arguments
    /// * `host` - 主機名稱或 IP
    /// * `port` - 連接埠
    pub async fn connect(&mut self, host: &str, port: u16) -> Result<(), TelnetError> {
        self.state = ConnectionState::Connecting;
        info!("正在連線到 {}:{}", host, port);

        let addr = format!("{}:{}", host, port);
        let socket_addrs: Vec<SocketAddr> = tokio::net::lookup_host(&addr)
            .await
            .map_err(|e| TelnetError::DnsResolutionFailed(e.to_string()))?
            .collect();

        if socket_addrs.is_empty() {
            return Err(TelnetError::DnsResolutionFailed(format!(
                "無法解析主機: {}",
                host
            )));
        }

        debug!("已解析到位址: {:?}", socket_addrs);

        let stream = timeout(
            self.config.connect_timeout,
            TcpStream::connect(&socket_addrs[0]),
        )
        .await
        .map_err(|_| TelnetError::Timeout)?
        .map_err(TelnetError::ConnectionFailed)?;

        stream.set_nodelay(true)?;

        info!("已連線到 {}:{}", host, port);
        self.attach(stream);

        Ok(())
    }

    /// 接上已建立的傳輸（加密通道、測試用記憶體通道）
    ///
    /// 解碼器重建：前一條連線的部分命令狀態在此丟棄
    pub fn attach(&mut self, stream: impl Transport + 'static) {
        self.stream = Some(Box::new(stream));
        self.decoder = TelnetDecoder::new();
        for option in &self.supported_options {
            self.decoder.set_supported(*option, true);
        }
        self.state = ConnectionState::Connected;
    }

    /// 斷開連線
    pub async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        if self.state != ConnectionState::Disconnected {
            self.state = ConnectionState::Disconnected;
            info!("已斷開連線");
        }
    }

    /// 發送一行文字到伺服器
    ///
    /// 以連線編碼轉碼、轉義字面 0xFF 並補上 CRLF
    pub async fn send(&mut self, text: &str) -> Result<(), TelnetError> {
        let mut data = escape_iac(&self.charset.encode(text));
        data.extend_from_slice(b"\r\n");
        self.send_raw(&data).await?;
        debug!("已發送: {}", text);
        Ok(())
    }

    /// 發送原始位元組到伺服器（不轉義，用於協商回應）
    pub async fn send_raw(&mut self, data: &[u8]) -> Result<(), TelnetError> {
        let stream = self.stream.as_mut().ok_or(TelnetError::NotConnected)?;
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    /// 讀取一次並處理 Telnet 協定
    ///
    /// 讀到 0 位元組視為連線結束。`DecodeOutput::replies` 中的
    /// 協商回應由呼叫方以 [`send_raw`](Self::send_raw) 送回；
    /// 此方法唯一的暫停點是 socket 讀取，可安全地被取消
    pub async fn read(&mut self) -> Result<DecodeOutput, TelnetError> {
        let mut buffer = vec![0u8; self.config.read_buffer_size];
        let n = {
            let stream = self.stream.as_mut().ok_or(TelnetError::NotConnected)?;
            stream.read(&mut buffer).await?
        };

        if n == 0 {
            self.state = ConnectionState::Disconnected;
            return Err(TelnetError::Disconnected);
        }

        DebugLogger::log_bytes("READ_RAW", &buffer[..n]);

        Ok(self.decoder.decode(&buffer[..n]))
    }
}

impl Default for TelnetClient {
    fn default() -> Self {
        Self::new(TelnetConfig::default(), Charset::default())
    }
}
