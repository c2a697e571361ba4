//! # 美化输出工具
//!
//! 提供统一的终端输出样式，以及转换报告的终端摘要。
//!
//! ## 依赖关系
//! - 被所有 `commands/` 模块使用
//! - 使用 `colored` crate

use crate::error::BackendFailure;
use crate::pipeline::ConversionReport;
use colored::Colorize;

/// 打印成功消息
pub fn print_success(msg: &str) {
    println!("{} {}", "[OK]".green().bold(), msg);
}

/// 打印错误消息
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

/// 打印警告消息
pub fn print_warning(msg: &str) {
    println!("{} {}", "[WARN]".yellow().bold(), msg);
}

/// 打印信息消息
pub fn print_info(msg: &str) {
    println!("{} {}", "[*]".blue().bold(), msg);
}

/// 打印跳过消息
pub fn print_skip(msg: &str) {
    println!("{} {}", "[SKIP]".dimmed(), msg);
}

/// 打印完成消息
pub fn print_done(msg: &str) {
    println!("{} {}", "[DONE]".green().bold(), msg);
}

/// 打印转换成功消息
pub fn print_conversion(from: &str, to: &str) {
    println!(
        "{} {} {} {}",
        "[OK]".green().bold(),
        from.dimmed(),
        "->".cyan(),
        to
    );
}

/// 打印标题栏
pub fn print_header(title: &str) {
    let line = "─".repeat(60);
    println!("\n{}", line.dimmed());
    println!("  {}", title.bold());
    println!("{}\n", line.dimmed());
}

/// 打印一次失败的后端尝试（缩进）
pub fn print_attempt(failure: &BackendFailure) {
    println!(
        "    {} {} {}",
        "x".red(),
        failure.backend.bold(),
        format!("({}) {}", failure.kind, failure.reason).dimmed()
    );
}

/// 打印转换报告摘要
pub fn print_report(report: &ConversionReport) {
    if report.success {
        print_conversion(&report.input, &report.output);
        println!(
            "    {} atoms, {} bonds, {} vertices, {} faces, {} bytes",
            report.stats.atom_count,
            report.stats.bond_count,
            report.stats.vertex_count,
            report.stats.face_count,
            report.stats.file_size
        );
        if let Some([a, b, c, alpha, beta, gamma]) = report.stats.lattice_parameters {
            println!(
                "    a={:.4} b={:.4} c={:.4} Å, α={:.2} β={:.2} γ={:.2}°",
                a, b, c, alpha, beta, gamma
            );
        }
        if let (Some(volume), Some(density)) = (report.stats.volume, report.stats.density) {
            println!("    volume {:.3} Å³, density {:.4} g/cm³", volume, density);
        }
    } else {
        let category = report.error_category.as_deref().unwrap_or("Failure");
        print_error(&format!("{} [{}]: {}", report.input, category, report.message));
    }

    let failed = report.failed_attempts().len();
    if failed > 0 {
        print_warning(&format!("{} backend attempt(s) failed", failed));
    }
    for step in &report.steps {
        if step.attempts.is_empty() {
            continue;
        }
        println!("  {} {}", "step".dimmed(), step.step.to_string().bold());
        for attempt in &step.attempts {
            print_attempt(attempt);
        }
    }
}
