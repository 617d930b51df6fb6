use super::Cli;
use anyhow::{Context, Result};
use chrono::Utc;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use console::style;
use idpurge_lib::util::{format_duration, format_timestamp};
use idpurge_lib::{
    default_scanners, AuditLog, CancelToken, Config, ConfirmationSource, DenyAll, Identity,
    OutcomeKind, PurgeEngine, Report, Resolver, RunContext, RunMode, SafetyGate, SystemProbe,
    TerminalConfirmer,
};
use signal_hook::consts::{SIGINT, SIGTERM};
use std::fs;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::time::{Duration, Instant};

pub fn handle_purge_command(cli: &Cli) -> Result<Report> {
    let started = Utc::now();
    let clock = Instant::now();

    let identities = cli
        .identities
        .iter()
        .map(|value| Identity::parse(value))
        .collect::<idpurge_lib::Result<Vec<_>>>()?;

    let config = Config::new(cli.log_dir.clone(), cli.config.clone(), cli.home.clone())?;

    let mode = if cli.execute {
        RunMode::Execute
    } else {
        RunMode::Preview
    };
    let timeout = cli
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.settings.confirm_timeout());
    let assume_yes = cli.yes || config.settings.assume_yes;

    let cancel = CancelToken::new();
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, cancel.flag())
            .with_context(|| format!("Failed to register handler for signal {}", signal))?;
    }

    let interactive = io::stdin().is_terminal() && console::user_attended_stderr();
    let confirmer: Box<dyn ConfirmationSource> = if mode == RunMode::Execute && interactive {
        Box::new(TerminalConfirmer::new())
    } else {
        if mode == RunMode::Execute {
            log::warn!("No terminal attached; every prompt will be answered no");
        }
        Box::new(DenyAll)
    };

    let gate = SafetyGate::new(Box::new(SystemProbe::new()), confirmer)
        .with_timeout(timeout)
        .with_assume_yes(assume_yes);
    let scanners = default_scanners(&config.home, &config.settings)?;
    let mut engine = PurgeEngine::new(scanners, Resolver::new(gate));

    let audit = AuditLog::create(&config.log_dir)?;
    log::info!("Audit log: {}", audit.path().display());
    log::info!("Home: {}", config.home.display());

    if !cli.quiet && mode == RunMode::Preview {
        println!(
            "{}",
            style("Preview: nothing will be changed. Re-run with --execute to apply.").yellow()
        );
    }

    let mut ctx = RunContext::new(identities, mode, audit)
        .with_verbose(cli.verbose)
        .with_cancel(cancel);
    engine.run(&mut ctx);
    let report = ctx.finish();

    if let Some(path) = &cli.json {
        export_json(&report, path)?;
    }

    if cli.quiet {
        print_remediations(&report);
    } else {
        print_summary(&report, mode, started, clock.elapsed());
    }

    Ok(report)
}

fn export_json(report: &Report, path: &Path) -> Result<()> {
    let json = report.to_json()?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Report written to {}", path.display());
    Ok(())
}

fn outcome_color(kind: OutcomeKind) -> Color {
    match kind {
        OutcomeKind::Deleted => Color::Green,
        OutcomeKind::WouldDelete | OutcomeKind::WouldFlag | OutcomeKind::Flagged => Color::Yellow,
        OutcomeKind::SkippedByUser | OutcomeKind::SkippedNoMatch => Color::Grey,
        OutcomeKind::Failed => Color::Red,
    }
}

fn print_summary(report: &Report, mode: RunMode, started: chrono::DateTime<Utc>, elapsed: Duration) {
    println!("\n{}", style("idpurge Report").bold().cyan());
    println!("{}", style("═".repeat(80)).dim());
    println!(
        "  Mode: {}   Started: {}   Took: {}",
        style(mode.as_str()).bold(),
        format_timestamp(&started),
        format_duration(elapsed)
    );
    println!();

    let rows: Vec<_> = report.actionable().collect();
    if rows.is_empty() {
        println!("{}\n", style("No residue found").green());
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            Cell::new("Identity").fg(Color::Cyan),
            Cell::new("Store").fg(Color::Cyan),
            Cell::new("Item").fg(Color::Cyan),
            Cell::new("Outcome").fg(Color::Cyan),
            Cell::new("Path").fg(Color::Cyan),
        ]);

        for outcome in rows {
            table.add_row(vec![
                Cell::new(&outcome.identity),
                Cell::new(outcome.store.as_str()),
                Cell::new(&outcome.label),
                Cell::new(outcome.kind.as_str()).fg(outcome_color(outcome.kind)),
                Cell::new(outcome.path.display()),
            ]);
        }
        println!("{}\n", table);
    }

    let counts = report
        .counts()
        .iter()
        .map(|(kind, n)| format!("{}: {}", kind, n))
        .collect::<Vec<_>>()
        .join("  ");
    println!("  {}", counts);

    print_remediations(report);

    if report.cancelled {
        println!(
            "\n{}",
            style("Run was interrupted; items after the last one listed were not examined.")
                .red()
                .bold()
        );
    }

    if let Some(path) = &report.audit_log {
        println!("\n  Audit log: {}", style(path.display()).dim());
    }
}

fn print_remediations(report: &Report) {
    let remediations = report.remediations();
    if remediations.is_empty() {
        return;
    }

    println!("\n{}", style("Manual follow-up").bold());
    println!("{}", style("─".repeat(80)).dim());
    for (n, outcome) in remediations.iter().enumerate() {
        let marker = if outcome.kind == OutcomeKind::Failed {
            style(format!("{:>3}.", n + 1)).red()
        } else {
            style(format!("{:>3}.", n + 1)).yellow()
        };
        println!(
            "{} [{} {}] {}",
            marker,
            outcome.store,
            outcome.label,
            outcome.remediation.as_deref().unwrap_or_default()
        );
        if let Some(error) = &outcome.error {
            println!("     {}", style(error).dim());
        }
    }
}
