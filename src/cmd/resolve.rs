use crate::reports;
use clap::Args;
use touchforge::error::{TfResult, TouchForgeError};
use touchforge::keycodes::{registry, KeyDescriptor};

#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Key names to resolve, e.g. `KeyW Spacebar ShiftRight`.
    pub names: Vec<String>,

    /// Print the whole vocabulary instead.
    #[arg(long, default_value_t = false)]
    pub list: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

pub fn run(args: &ResolveArgs) -> TfResult<()> {
    let reg = registry();

    if args.list {
        if args.json {
            println!("{}", serde_json::to_string_pretty(reg.descriptors())?);
        } else {
            reports::print_key_vocabulary(reg.descriptors(), reg.aliases());
        }
        return Ok(());
    }

    if args.names.is_empty() {
        return Err(TouchForgeError::Config(
            "give at least one key name, or --list".to_string(),
        ));
    }

    let resolved: Vec<(String, KeyDescriptor)> = args
        .names
        .iter()
        .map(|name| reg.resolve(name).map(|d| (name.clone(), d)))
        .collect::<Result<_, _>>()?;

    if args.json {
        let descriptors: Vec<&KeyDescriptor> = resolved.iter().map(|(_, d)| d).collect();
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
    } else {
        reports::print_key_descriptors(&resolved);
    }
    Ok(())
}
