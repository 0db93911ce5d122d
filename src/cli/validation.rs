use crate::cli::args::CliArgs;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.output_format.as_deref() {
        crate::output::OutputFormat::parse(raw)
            .ok_or_else(|| format!("invalid --output-format '{raw}', expected text, json or html"))?;
    }
    crate::utils::collect_types(&args.types)
        .map_err(|e| format!("invalid --type: {e}"))?;
    if args.interactive && args.list_types {
        return Err("use either --interactive or --list-types, not both".to_string());
    }
    if args.interactive && args.output.is_some() {
        return Err("--interactive writes to the terminal and cannot be combined with --output"
            .to_string());
    }
    if let Some(source) = args.source.as_deref() {
        if source.trim().is_empty() {
            return Err("invalid --source, expected a path or URL".to_string());
        }
    }
    Ok(())
}
