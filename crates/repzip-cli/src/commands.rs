//! Command implementations.
//!
//! Each command resolves its inputs, does its work through
//! `repzip_core`, prints its payload on stdout and returns the exit code.

use crate::cli::{BuildArgs, GlobalOpts, ListArgs};
use crate::exit_codes::ExitCode;
use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};
use crate::output::{render_error, render_listing, render_summary, OutputFormat};
use repzip_core::config::{resolve_compression, resolve_permissions};
use repzip_core::{build_archive, ArchiveError, ArchiveReader, DirectoryBuild, SessionOptions};

/// Run `repzip build`.
pub fn run_build(global: &GlobalOpts, args: &BuildArgs) -> ExitCode {
    let ctx = LogContext::new("build", args.output.display());
    let _run = ctx.span().entered();
    log_event!(ctx, INFO, event_names::RUN_STARTED, Stage::Init, "Starting build command");

    match build(&ctx, args) {
        Ok(summary) => {
            log_event!(
                ctx,
                INFO,
                event_names::BUILD_FINISHED,
                Stage::Archive,
                "Archive written",
                entries = summary.entries,
                bytes = summary.archive_bytes,
                sha256 = %summary.sha256
            );
            print_payload(&ctx, render_summary(&summary, global.format))
        }
        Err(err) => fail(global, &ctx, Stage::Archive, &err),
    }
}

fn build(ctx: &LogContext, args: &BuildArgs) -> Result<repzip_core::BuildSummary, ArchiveError> {
    let compression = resolve_compression(args.compression)?;
    let permissions = resolve_permissions(args.permissions)?;
    log_event!(
        ctx,
        DEBUG,
        event_names::CONFIG_LOADED,
        Stage::Init,
        "Settings resolved",
        compression = %compression.value,
        compression_source = %compression.source,
        permissions = %permissions.value,
        permissions_source = %permissions.source
    );

    let mut options = SessionOptions::from_env()
        .with_compression(compression.value)
        .with_permissions(permissions.value);
    if let Some(time) = &args.time {
        options = options.with_time(time.clone());
    }

    let build = DirectoryBuild::new(&args.root, args.patterns.iter().cloned())
        .recursive(args.recursive);
    log_event!(
        ctx,
        INFO,
        event_names::BUILD_STARTED,
        Stage::Walk,
        "Building archive",
        root = %args.root.display(),
        recursive = args.recursive
    );

    let summary = build_archive(&args.output, &build, &options)?;
    log_event!(
        ctx,
        DEBUG,
        event_names::TIME_RESOLVED,
        Stage::Archive,
        "Entry timestamp",
        timestamp = %summary.timestamp,
        source = %summary.timestamp_source,
        diagnostics = summary.diagnostics.len()
    );
    Ok(summary)
}

/// Run `repzip list`.
pub fn run_list(global: &GlobalOpts, args: &ListArgs) -> ExitCode {
    let ctx = LogContext::new("list", args.archive.display());
    let _run = ctx.span().entered();
    log_event!(ctx, INFO, event_names::LIST_STARTED, Stage::Inspect, "Reading archive");

    let mut reader = match ArchiveReader::open(&args.archive) {
        Ok(reader) => reader,
        Err(err) => return fail(global, &ctx, Stage::Inspect, &err),
    };

    let failures = if args.verify {
        reader.verify_all()
    } else {
        Vec::new()
    };

    log_event!(
        ctx,
        INFO,
        event_names::LIST_FINISHED,
        Stage::Inspect,
        "Archive read",
        entries = reader.len(),
        verified = args.verify,
        failures = failures.len()
    );

    let code = print_payload(&ctx, render_listing(reader.entries(), global.format));
    if failures.is_empty() {
        return code;
    }
    for name in &failures {
        eprintln!("corrupt entry: {name}");
    }
    ExitCode::InternalError
}

fn print_payload(ctx: &LogContext, payload: serde_json::Result<String>) -> ExitCode {
    match payload {
        Ok(text) => {
            println!("{text}");
            ExitCode::Clean
        }
        Err(err) => {
            log_event!(
                ctx,
                ERROR,
                event_names::INTERNAL_ERROR,
                Stage::Report,
                "Could not render payload",
                error = %err
            );
            ExitCode::InternalError
        }
    }
}

/// Log and report `err`; the payload goes to stdout in JSON mode and to
/// stderr otherwise.
fn fail(global: &GlobalOpts, ctx: &LogContext, stage: Stage, err: &ArchiveError) -> ExitCode {
    let code = ExitCode::from(err);
    if code.is_internal_error() {
        log_event!(
            ctx,
            ERROR,
            event_names::INTERNAL_ERROR,
            stage,
            "Command failed",
            error = %err,
            exit_code = code.as_i32()
        );
    } else {
        log_event!(
            ctx,
            WARN,
            event_names::RUN_FAILED,
            stage,
            "Command failed",
            error = %err,
            exit_code = code.as_i32()
        );
    }

    match render_error(&err.to_string(), code, global.format) {
        Ok(text) if global.format == OutputFormat::Json => println!("{text}"),
        Ok(text) => eprintln!("{text}"),
        Err(_) => eprintln!("error: {err}"),
    }
    code
}
