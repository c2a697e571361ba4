//! # backends 命令实现
//!
//! 按注册顺序列出解析后端和打包后端；打包后端附带可用性探测结果。
//! 探测只用于显示，不改变注册顺序。
//!
//! ## 依赖关系
//! - 使用 `cli/backends.rs` 定义的参数
//! - 使用 `parsers/`, `packaging/`

use crate::cli::backends::BackendsArgs;
use crate::error::Result;
use crate::packaging::PackageConverter;
use crate::parsers::StructureParser;
use crate::pipeline::options::DEFAULT_TIMEOUT_SECS;
use crate::utils::output;

use std::time::Duration;
use tabled::{Table, Tabled};

/// 后端表格行
#[derive(Debug, Clone, Tabled)]
struct BackendRow {
    #[tabled(rename = "Order")]
    order: usize,
    #[tabled(rename = "Stage")]
    stage: &'static str,
    #[tabled(rename = "Backend")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// 执行 backends 命令
pub fn execute(args: BackendsArgs) -> Result<()> {
    output::print_header("Conversion Backends");

    let config = args.backends.to_config();
    let parser = StructureParser::default();
    let packager = PackageConverter::from_config(&config, Duration::from_secs(DEFAULT_TIMEOUT_SECS));

    let mut rows: Vec<BackendRow> = parser
        .backend_names()
        .into_iter()
        .enumerate()
        .map(|(i, name)| BackendRow {
            order: i + 1,
            stage: "parse",
            name: name.to_string(),
            status: "built-in".to_string(),
        })
        .collect();

    let statuses: Vec<(String, Option<bool>)> = if args.no_probe {
        packager
            .backend_names()
            .into_iter()
            .map(|n| (n.to_string(), None))
            .collect()
    } else {
        output::print_info("Probing packaging backends...");
        packager
            .probe_all()
            .into_iter()
            .map(|(n, ok)| (n, Some(ok)))
            .collect()
    };

    if statuses.is_empty() {
        output::print_warning("All packaging backends are disabled");
    }

    rows.extend(statuses.into_iter().enumerate().map(|(i, (name, ok))| BackendRow {
        order: i + 1,
        stage: "package",
        name,
        status: match ok {
            Some(true) => "available".to_string(),
            Some(false) => "unavailable".to_string(),
            None => "not probed".to_string(),
        },
    }));

    let table = Table::new(&rows);
    println!("{}", table);

    Ok(())
}
