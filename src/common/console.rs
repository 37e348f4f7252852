//! # console 模块
//!
//! 面向操作者的状态输出。核心流程只产生 [`StatusEvent`]，
//! 如何渲染由 [`StatusSink`] 的实现决定：
//!
//! - [`ConsoleStatus`]：带时间戳与颜色标签打印到标准输出；
//! - 测试中可替换为记录事件的实现。

use chrono::Local;
use colored::Colorize;
use dialoguer::Input;

use crate::common::error::ApiError;

/// 状态事件，字段均为结构化数据，不含渲染细节。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// 凭证抓取成功
    Success { credential: String, guilds: usize },
    /// 凭证因网络故障终止
    Failure { credential: String, reason: String },
    Info(String),
    /// 运行结束时的汇总
    Results { total: usize, duplicates: usize },
}

pub trait StatusSink: Send + Sync {
    fn report(&self, event: StatusEvent);
}

pub fn timestamp() -> String {
    Local::now().format("[%H:%M:%S]").to_string()
}

const BANNER: &str = r"
      ____       _ _     _ _   _           _
     / ___|_   _(_) | __| | | | |_   _  __| |_ __ __ _
    | |  _| | | | | |/ _` | |_| | | | |/ _` | '__/ _` |
    | |_| | |_| | | | (_| |  _  | |_| | (_| | | | (_| |
     \____|\__,_|_|_|\__,_|_| |_|\__, |\__,_|_|  \__,_|
                                 |___/
";

/// 启动横幅
pub fn banner() -> String {
    BANNER.blue().to_string()
}

/// 交互输入提示的前缀
pub fn prompt_prefix() -> String {
    format!("{} {}", timestamp(), "[INPUT]".blue())
}

/// 交互询问并发数，直到输入正整数为止
pub fn prompt_workers() -> Result<usize, ApiError> {
    let workers = Input::<usize>::new()
        .with_prompt(format!(
            " {} Please input the amount of threads you want to use",
            prompt_prefix()
        ))
        .validate_with(|n: &usize| if *n > 0 { Ok(()) } else { Err("Please enter a valid number.") })
        .interact_text()?;
    Ok(workers)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleStatus;

impl ConsoleStatus {
    pub fn render(event: &StatusEvent) -> String {
        match event {
            StatusEvent::Success { credential, guilds } => format!(
                "{} {} {} | Guilds: {}",
                "[SUCCESS]".green(),
                "Token:".white(),
                credential.cyan(),
                guilds.to_string().cyan()
            ),
            StatusEvent::Failure { credential, reason } => format!(
                "{} {} {} {} {}",
                "[FAIL]".red(),
                "Token:".white(),
                credential.cyan(),
                "[ISSUE]".red(),
                reason
            ),
            StatusEvent::Info(message) => format!("{} {}", "[INFO]".blue(), message),
            StatusEvent::Results { total, duplicates: 0 } => format!(
                "{} {}",
                "[RESULTS]".yellow(),
                format!("Fetched {} guilds and no dupes were found.", total).white()
            ),
            StatusEvent::Results { total, duplicates } => format!(
                "{} Fetched {} and removed {} duplicates from the list.",
                "[RESULTS]".yellow(),
                total,
                duplicates
            ),
        }
    }
}

impl StatusSink for ConsoleStatus {
    fn report(&self, event: StatusEvent) {
        println!(" {} {}", timestamp(), Self::render(&event));
    }
}
