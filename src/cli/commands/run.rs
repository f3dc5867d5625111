//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command of the Sisyphus CLI, which
//! discovers tests in the configured directories, runs them concurrently and
//! compares each result with its expectation.
//!
//! 此模块实现了 Sisyphus CLI 的 `run` 命令，
//! 在配置的目录中发现测试，并发运行它们，并将每个结果与其期望进行比较。

use anyhow::{Context, Result};
use colored::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{
    core::{
        config::SuiteConfig,
        discovery::{self, TestFactory},
        environment::{Environment, Value},
        lock::CpuLock,
        suite::{self, TestReport},
    },
    infra::t,
    plugins,
    reporting::{print_summary, print_unexpected_failure_details, write_json_report},
};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "sisyphus.toml";

/// Arguments of the `run` subcommand, as collected from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub dirs: Vec<PathBuf>,
    pub factories: Vec<String>,
    pub settings: Vec<String>,
    pub json: Option<PathBuf>,
    /// `--lang`, wherever it appeared on the command line.
    pub lang: Option<String>,
}

/// Executes the run command.
///
/// `system_locale` is used only when neither `--lang` nor the config file's
/// `language` names one.
///
/// 执行运行命令。语言优先级：`--lang`，配置文件的 `language`，系统语言。
pub async fn execute(args: RunArgs, system_locale: &str) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let locale = resolve_locale(
        args.lang.as_deref(),
        config.language.as_deref(),
        system_locale,
    );
    rust_i18n::set_locale(&locale);

    let mut defaults = config.build_environment(&plugins::default_environment())?;
    apply_settings(&mut defaults, &args.settings)?;

    let dirs = if args.dirs.is_empty() {
        config.dirs.clone()
    } else {
        args.dirs.clone()
    };
    if dirs.is_empty() {
        anyhow::bail!(t!("run.no_dirs", locale = locale));
    }

    let factory_names = if args.factories.is_empty() {
        &config.factories
    } else {
        &args.factories
    };
    let factories = resolve_factories(factory_names, &locale)?;

    let tests = discovery::create_tests(&dirs, &factories, &defaults);
    if tests.is_empty() {
        println!("{}", t!("run.no_tests", locale = locale).green());
        return Ok(());
    }

    let jobs = args.jobs.or(config.jobs).unwrap_or_else(num_cpus::get);
    println!(
        "{}",
        t!("run.running", locale = locale, count = tests.len(), jobs = jobs).bold()
    );

    let stop_token = setup_signal_handler(&locale);
    let lock = Arc::new(CpuLock::new());
    let reports = suite::run_tests(tests, jobs, &config.expectations, lock, stop_token).await;

    print_summary(&reports, &locale);

    if let Some(report_path) = &args.json {
        println!(
            "\n{}",
            t!("run.json_report", locale = locale, path = report_path.display())
        );
        if let Err(e) = write_json_report(&reports, report_path) {
            eprintln!("{} {:#}", t!("run.json_report_failed", locale = locale).red(), e);
        }
    }

    let unexpected: Vec<&TestReport> = reports.iter().filter(|r| r.status.is_unexpected()).collect();
    if unexpected.is_empty() {
        println!("\n{}", t!("run.all_passed", locale = locale).green().bold());
        Ok(())
    } else {
        print_unexpected_failure_details(&unexpected, &locale);
        anyhow::bail!(t!("run.unexpected_results", locale = locale, count = unexpected.len()));
    }
}

/// Output language: the command line wins over the config file, which wins
/// over the system locale.
pub fn resolve_locale(cli: Option<&str>, config: Option<&str>, system: &str) -> String {
    cli.or(config).unwrap_or(system).to_string()
}

/// Loads the suite configuration: the explicit file, else `sisyphus.toml` in
/// the working directory, else built-in defaults.
fn load_config(path: Option<&Path>) -> Result<SuiteConfig> {
    match path {
        Some(path) => SuiteConfig::load(path),
        None => {
            let fallback = Path::new(DEFAULT_CONFIG_FILE);
            if fallback.is_file() {
                SuiteConfig::load(fallback)
            } else {
                Ok(SuiteConfig::default())
            }
        }
    }
}

/// Applies `KEY=VALUE` overrides from the command line. They win over both
/// built-in defaults and the config file, whatever its override protection.
fn apply_settings(env: &mut Environment, settings: &[String]) -> Result<()> {
    if settings.is_empty() {
        return Ok(());
    }

    let protected = env.is_protected();
    env.set_protection(false);
    for setting in settings {
        let (key, value) = parse_setting(setting)?;
        env.set(key, value)?;
    }
    env.set_protection(protected);
    Ok(())
}

/// Parses `KEY=VALUE`, typing the value as an integer, float or boolean when
/// it reads as one and as a string otherwise.
pub fn parse_setting(setting: &str) -> Result<(String, Value)> {
    let (key, raw) = setting
        .split_once('=')
        .with_context(|| format!("Invalid setting '{setting}', expected KEY=VALUE"))?;
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("Invalid setting '{setting}', key is empty");
    }

    // `nan` and `inf` parse as floats but are meant as strings.
    let float = raw
        .parse::<f64>()
        .ok()
        .filter(|_| raw.bytes().any(|b| b.is_ascii_digit()));

    let value = if let Ok(i) = raw.parse::<i64>() {
        Value::Int(i)
    } else if let Some(f) = float {
        Value::Float(f)
    } else if let Ok(b) = raw.parse::<bool>() {
        Value::Bool(b)
    } else {
        Value::Str(raw.to_string())
    };
    Ok((key.to_string(), value))
}

fn resolve_factories(names: &[String], locale: &str) -> Result<Vec<Box<dyn TestFactory>>> {
    if names.is_empty() {
        return Ok(plugins::default_factories());
    }
    names
        .iter()
        .map(|name| {
            plugins::factory_by_name(name).with_context(|| {
                t!("run.unknown_factory", locale = locale, name = name).to_string()
            })
        })
        .collect()
}

/// Sets up a signal handler for graceful shutdown.
///
/// Ctrl-C stops scheduling new tests; tests already running finish.
fn setup_signal_handler(locale: &str) -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();
    let locale = locale.to_string();

    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                println!("\n{}", t!("run.shutdown_signal", locale = &locale).yellow());
                token_clone.cancel();
            }
            Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
        }
    });

    token
}
