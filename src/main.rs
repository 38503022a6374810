//! CLI entry point for `gmailctrl`.

use std::path::{Path, PathBuf};

use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use unicode_width::UnicodeWidthChar;

use gmailctrl::analysis::{self, rank, select};
use gmailctrl::config::Config;
use gmailctrl::download::{self, DownloadReport};
use gmailctrl::i18n;
use gmailctrl::model::group::SenderGroup;
use gmailctrl::source::gmail;
use gmailctrl::source::payload::PayloadDirFetcher;

#[derive(Parser)]
#[command(name = "gmailctrl", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Language (en, es). Defaults to system locale.
    #[arg(long, global = true, value_name = "LANG")]
    lang: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List senders ranked by message count
    Senders {
        /// JSON array of Gmail message resources
        path: PathBuf,
        /// Maximum number of messages to group
        #[arg(long)]
        limit: Option<usize>,
        /// Only show the first N senders
        #[arg(long)]
        top: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Show one sender group
    Show {
        path: PathBuf,
        sender: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print bulk action requests
    Plan {
        path: PathBuf,
        #[arg(short, long, value_enum)]
        action: select::BulkAction,
        /// Sender address to include (repeatable)
        #[arg(short, long = "sender", required = true)]
        senders: Vec<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Download attachments
    Download {
        /// JSON array of Gmail message resources (format=full)
        path: PathBuf,
        /// Directory of saved attachment responses
        #[arg(short, long)]
        payloads: PathBuf,
        /// Archive root (default from config: downloads)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Only emails newer than this many days
        #[arg(long)]
        days: Option<u32>,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

/// Detect language early from --lang arg or system env, before clap processes --help.
fn detect_lang_early() -> i18n::Lang {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--lang" {
            if let Some(lang) = args.get(i + 1).and_then(|c| i18n::Lang::from_code(c)) {
                return lang;
            }
        }
        if let Some(lang) = args[i]
            .strip_prefix("--lang=")
            .and_then(i18n::Lang::from_code)
        {
            return lang;
        }
    }
    i18n::detect_system_lang()
}

/// Build a localized clap Command using i18n strings.
fn build_localized_command() -> clap::Command {
    let mut cmd = Cli::command()
        .about(i18n::app_about())
        .long_about(i18n::app_long_about())
        .after_help(i18n::app_after_help());

    let subcommands: Vec<clap::Command> = cmd
        .get_subcommands()
        .map(|sub| {
            let s = sub.clone();
            match s.get_name() {
                "senders" => s.about(i18n::help_cmd_senders()),
                "show" => s.about(i18n::help_cmd_show()),
                "plan" => s.about(i18n::help_cmd_plan()),
                "download" => s.about(i18n::help_cmd_download()),
                "completions" => s.about(i18n::help_cmd_completions()),
                "manpage" => s.about(i18n::help_cmd_manpage()),
                _ => s,
            }
        })
        .collect();

    for sub in subcommands {
        cmd = cmd.mut_subcommand(sub.get_name(), |_| sub.clone());
    }

    cmd
}

fn main() -> anyhow::Result<()> {
    // Detect language BEFORE clap parsing so --help is localized
    i18n::set_lang(detect_lang_early());

    let matches = build_localized_command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;

    let config = gmailctrl::config::load_config();

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    let result = match cli.command {
        Commands::Senders {
            path,
            limit,
            top,
            json,
        } => cmd_senders(&path, limit, top, json, &config),
        Commands::Show {
            path,
            sender,
            limit,
        } => cmd_show(&path, &sender, limit, &config),
        Commands::Plan {
            path,
            action,
            senders,
            limit,
        } => cmd_plan(&path, action, &senders, limit, &config),
        Commands::Download {
            path,
            payloads,
            output,
            days,
        } => cmd_download(&path, &payloads, output, days, &config),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %format!("{e:#}"), "Command failed");
    }
    result
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_path = gmailctrl::config::log_file_path(config);
    let log_dir = log_path
        .parent()
        .map(std::path::Path::to_path_buf)
        .unwrap_or_default();
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender =
            tracing_appender::rolling::never(&log_dir, gmailctrl::config::LOG_FILE_NAME);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Load, group, and rank the messages in `path`.
fn load_groups(
    path: &Path,
    limit: Option<usize>,
    config: &Config,
) -> anyhow::Result<(usize, Vec<SenderGroup>)> {
    if !path.exists() {
        anyhow::bail!("{}: {}", i18n::err_file_not_found(), path.display());
    }
    let records = gmail::load_records(path, Some(limit.unwrap_or(config.scan.limit)))?;
    Ok((records.len(), analysis::analyze(&records)))
}

fn cmd_senders(
    path: &Path,
    limit: Option<usize>,
    top: Option<usize>,
    json: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let (scanned, mut groups) = load_groups(path, limit, config)?;

    let top = top.unwrap_or(config.scan.top);
    if top > 0 {
        groups.truncate(top);
    }

    if json {
        print_groups_json(scanned, &groups)
    } else {
        print_groups_table(scanned, &groups, &config.display.date_format);
        Ok(())
    }
}

fn cmd_show(
    path: &Path,
    sender: &str,
    limit: Option<usize>,
    config: &Config,
) -> anyhow::Result<()> {
    let (_, groups) = load_groups(path, limit, config)?;
    let wanted = sender.trim().to_lowercase();
    let Some(group) = groups.iter().find(|g| g.address == wanted) else {
        anyhow::bail!("{}: {}", i18n::err_sender_not_found(), sender);
    };

    let fmt = &config.display.date_format;
    println!();
    println!("  {:<15} {} <{}>", i18n::msg_sender(), group.display_name, group.address);
    println!("  {:<15} {}", i18n::msg_count(), group.count());
    println!(
        "  {:<15} {} \u{2014} {}",
        i18n::msg_date_range(),
        group.oldest.format(fmt),
        group.newest.format(fmt)
    );
    println!("  {:<15} {}", i18n::msg_attachments(), group.total_attachments);
    println!(
        "  {:<15} {}",
        i18n::msg_unsubscribe(),
        if group.has_unsubscribe {
            i18n::msg_yes()
        } else {
            i18n::msg_no()
        }
    );
    println!();
    println!("  {:<17} {}", i18n::col_date(), i18n::col_subject());
    println!("  {}", "-".repeat(98));
    for message in rank::newest_first(group) {
        println!(
            "  {:<17} {}",
            message.date.format("%Y-%m-%d %H:%M"),
            truncate(&message.subject, 80)
        );
    }
    println!();
    Ok(())
}

fn cmd_plan(
    path: &Path,
    action: select::BulkAction,
    senders: &[String],
    limit: Option<usize>,
    config: &Config,
) -> anyhow::Result<()> {
    let (_, groups) = load_groups(path, limit, config)?;
    let ids = select::selected_message_ids(&groups, senders);
    let requests = select::plan(action, &ids);

    tracing::info!(
        action = action.name(),
        messages = ids.len(),
        requests = requests.len(),
        "Planned bulk action"
    );

    let output = serde_json::json!({
        "action": action.name(),
        "message_count": ids.len(),
        "requests": requests,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn cmd_download(
    path: &Path,
    payloads: &Path,
    output: Option<PathBuf>,
    days: Option<u32>,
    config: &Config,
) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("{}: {}", i18n::err_file_not_found(), path.display());
    }
    let root = output.unwrap_or_else(|| config.download.output_dir.clone());
    let days = days.unwrap_or(config.download.days);

    let attachments = gmail::newer_than(gmail::load_attachments(path)?, days, chrono::Utc::now());
    if attachments.is_empty() {
        println!("  {}", i18n::msg_no_attachments());
        return Ok(());
    }

    let pb = ProgressBar::new(attachments.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} {} [{{bar:40.cyan/blue}}] {{pos}}/{{len}}",
                i18n::msg_downloading()
            ))
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let mut fetcher = PayloadDirFetcher::new(payloads);
    let result = download::run(
        &attachments,
        &root,
        &mut fetcher,
        &config.download.options(),
        Some(&|current, _total| {
            pb.set_position(current as u64);
        }),
    );
    pb.finish_and_clear();

    match result {
        Ok(report) => {
            print_download_table(&report);
            Ok(())
        }
        Err(failure) => {
            print_download_table(&failure.report);
            eprintln!("  {}", i18n::msg_download_failed());
            Err(failure.into())
        }
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "gmailctrl", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

/// Cut `s` to at most `width` terminal columns.
fn truncate(s: &str, width: usize) -> String {
    let mut used = 0;
    s.chars()
        .take_while(|c| {
            used += c.width().unwrap_or(0);
            used <= width
        })
        .collect()
}

/// Print ranked sender groups as a human-readable table.
fn print_groups_table(scanned: usize, groups: &[SenderGroup], date_format: &str) {
    println!();
    println!("  {:<20} {}", i18n::msg_messages_scanned(), scanned);
    println!("  {:<20} {}", i18n::msg_senders(), groups.len());
    println!();

    if groups.is_empty() {
        return;
    }

    println!(
        "  {:>6} {:<35} {:<12} {:>5} {:<5} {}",
        i18n::col_count(),
        i18n::col_sender(),
        i18n::col_newest(),
        i18n::col_attachments(),
        i18n::col_unsubscribe(),
        i18n::col_subject()
    );
    println!("  {}", "-".repeat(110));

    for group in groups {
        println!(
            "  {:>6} {:<35} {:<12} {:>5} {:<5} {}",
            group.count(),
            truncate(group.label(), 34),
            group.newest.format(date_format).to_string(),
            group.total_attachments,
            if group.has_unsubscribe { "[U]" } else { "" },
            truncate(&group.newest_subject, 45)
        );
    }
    println!();
}

/// Print ranked sender groups as JSON.
fn print_groups_json(scanned: usize, groups: &[SenderGroup]) -> anyhow::Result<()> {
    let items: Vec<serde_json::Value> = groups
        .iter()
        .map(|g| {
            serde_json::json!({
                "address": g.address,
                "display_name": g.display_name,
                "count": g.count(),
                "oldest": g.oldest.to_rfc3339(),
                "newest": g.newest.to_rfc3339(),
                "newest_subject": g.newest_subject,
                "total_attachments": g.total_attachments,
                "has_unsubscribe": g.has_unsubscribe,
                "message_ids": g.message_ids().collect::<Vec<_>>(),
            })
        })
        .collect();

    let output = serde_json::json!({
        "messages_scanned": scanned,
        "sender_count": groups.len(),
        "senders": items,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Print the per-directory download summary.
fn print_download_table(report: &DownloadReport) {
    println!();
    println!(
        "  {:<40} {:>6} {:>8} {:>10}",
        i18n::col_directory(),
        i18n::col_files(),
        i18n::col_skipped(),
        i18n::col_size()
    );
    println!("  {}", "-".repeat(67));
    for (dir, summary) in &report.summary {
        println!(
            "  {:<40} {:>6} {:>8} {:>10}",
            truncate(dir, 39),
            summary.files_written,
            summary.files_skipped,
            format_size(summary.total_bytes, BINARY)
        );
    }
    println!("  {}", "-".repeat(67));
    println!(
        "  {:<40} {:>6} {:>8} {:>10}",
        i18n::msg_total(),
        report.files_written(),
        report.summary.values().map(|s| s.files_skipped).sum::<usize>(),
        format_size(report.total_bytes(), BINARY)
    );
    println!();
}
