use tickchan_channel::stat_channel;

use crate::cmd::InfoArgs;
use crate::exit::{channel_error, CliResult, SUCCESS};
use crate::output::{print_info, OutputFormat};

pub fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let (stat, last) = stat_channel(&args.path, args.channels)
        .map_err(|err| channel_error("stat failed", err))?;

    print_info(
        &args.path.display().to_string(),
        &stat,
        last.as_ref(),
        format,
    );
    Ok(SUCCESS)
}
