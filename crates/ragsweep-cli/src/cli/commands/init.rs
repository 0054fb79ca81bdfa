use crate::cli::args::InitArgs;
use crate::exit_codes;
use ragsweep_core::config::write_sample_config;

pub fn run(args: InitArgs) -> anyhow::Result<i32> {
    if args.path.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            args.path.display()
        );
    }
    if let Some(parent) = args.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    write_sample_config(&args.path)?;
    println!("wrote {}", args.path.display());
    Ok(exit_codes::SUCCESS)
}
