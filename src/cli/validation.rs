use crate::cli::args::CliArgs;
use crate::output::OutputFormat;
use crate::session::App;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(rows) = args.rows {
        if rows == 0 {
            return Err("invalid rows, expected positive integer".to_string());
        }
    }
    if args.rows.is_some() && args.all {
        return Err("--rows and --all are mutually exclusive".to_string());
    }
    if let Some(ms) = args.poll_interval {
        if ms == 0 {
            return Err("invalid poll-interval, expected positive milliseconds".to_string());
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive seconds".to_string());
        }
    }
    if let Some(raw) = args.app.as_deref() {
        raw.parse::<App>()
            .map_err(|e| format!("invalid --app '{raw}': {e}"))?;
    }
    if let Some(raw) = args.header.as_deref() {
        crate::utils::parse_header(raw).map_err(|e| format!("invalid --header '{raw}': {e}"))?;
    }
    if let Some(raw) = args.output_format.as_deref() {
        if OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --output-format '{raw}', expected text or json"
            ));
        }
    }
    for key in args.publish.iter().chain(args.unpublish.iter()) {
        if key.trim().is_empty() {
            return Err("publish/unpublish keys must not be empty".to_string());
        }
    }
    if args.interactive && (!args.publish.is_empty() || !args.unpublish.is_empty()) {
        return Err("--interactive cannot be combined with --publish/--unpublish".to_string());
    }
    Ok(())
}
