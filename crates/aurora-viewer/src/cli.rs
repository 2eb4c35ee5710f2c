use std::path::PathBuf;

use anyhow::{Context, Result, bail};

pub const USAGE: &str = "\
usage: aurora-viewer [options]

  --skybox <dir>     directory with right/left/top/bottom/front/back images
  --emission <file>  emission texture for the light markers
  --no-fxaa          start with antialiasing disabled
  --blur <n>         number of blur iterations (default 10)
  -h, --help         print this help";

/// Command-line options.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ViewerArgs {
    pub skybox_dir: Option<PathBuf>,
    pub emission: Option<PathBuf>,
    pub no_fxaa: bool,
    pub blur_passes: Option<u32>,
    pub help: bool,
}

impl ViewerArgs {
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut out = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--skybox" => out.skybox_dir = Some(value(&mut args, &arg)?.into()),
                "--emission" => out.emission = Some(value(&mut args, &arg)?.into()),
                "--no-fxaa" => out.no_fxaa = true,
                "--blur" => {
                    let raw = value(&mut args, &arg)?;
                    let n = raw
                        .parse()
                        .with_context(|| format!("--blur expects a count, got `{raw}`"))?;
                    out.blur_passes = Some(n);
                }
                "-h" | "--help" => out.help = true,
                other => bail!("unknown argument `{other}`\n\n{USAGE}"),
            }
        }
        Ok(out)
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .with_context(|| format!("{flag} expects a value"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<ViewerArgs> {
        ViewerArgs::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn empty_is_default() {
        assert_eq!(parse(&[]).unwrap(), ViewerArgs::default());
    }

    #[test]
    fn all_flags() {
        let args = parse(&[
            "--skybox", "sky", "--emission", "glow.png", "--no-fxaa", "--blur", "4",
        ])
        .unwrap();
        assert_eq!(args.skybox_dir, Some(PathBuf::from("sky")));
        assert_eq!(args.emission, Some(PathBuf::from("glow.png")));
        assert!(args.no_fxaa);
        assert_eq!(args.blur_passes, Some(4));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse(&["--blur"]).is_err());
        assert!(parse(&["--blur", "-1"]).is_err());
        assert!(parse(&["--wat"]).is_err());
    }
}
