use super::load_config;
use crate::cli::args::VariantsArgs;
use crate::exit_codes;

/// One line per variant: name, turn shape, answer marker.
pub fn run(args: VariantsArgs) -> anyhow::Result<i32> {
    let cfg = load_config(args.config.as_deref())?;
    for v in cfg.variants()? {
        let shape = match (&v.system, &v.user) {
            (Some(_), Some(_)) => "system+user",
            (Some(_), None) => "system",
            (None, Some(_)) => "user",
            (None, None) => "empty",
        };
        println!(
            "{}\t{}\t{}",
            v.name,
            shape,
            v.answer_marker.as_deref().unwrap_or("-")
        );
    }
    Ok(exit_codes::SUCCESS)
}
