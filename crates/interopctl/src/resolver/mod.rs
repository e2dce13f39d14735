//! Option and positional argument resolution shared by every entry point.
//!
//! Options follow getopts rules: they come before positionals, may be
//! clustered (`-nz zone`), and `--` ends them. `-p`, `-z`, `-n` and `-f` are
//! understood everywhere; `-d`, `-r`, `-s` and `-h` only by the entry points
//! that declare them. Anything else is reported and skipped.

mod positional;

pub use positional::{
    CloudProdArgs, CloudProdAuthTestArgs, CloudProdTestArgs, InteropTestArgs,
    InteropTestFlagsArgs, LaunchServerArgs, PushDockerfilesArgs, SyncImagesArgs,
    UpdateImageArgs,
};

use crate::conf::{Defaults, Settings};
use crate::error::Error;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Names accepted by `-f`, one per entry point.
pub const RESOLVERS: &[&str] = &[
    PushDockerfilesArgs::RESOLVER,
    UpdateImageArgs::RESOLVER,
    SyncImagesArgs::RESOLVER,
    LaunchServerArgs::RESOLVER,
    InteropTestArgs::RESOLVER,
    CloudProdTestArgs::RESOLVER,
    CloudProdAuthTestArgs::RESOLVER,
    InteropTestFlagsArgs::RESOLVER,
];

/// Where and how an entry point runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub project: String,
    pub zone: String,
    pub dry_run: bool,
}

/// Values of the entry-point specific flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extras {
    pub dockerfile_root: Option<PathBuf>,
    pub storage_root: Option<String>,
    pub script_root: Option<PathBuf>,
    pub hosts: Vec<String>,
}

impl Extras {
    fn set(&mut self, flag: char, value: String) {
        match flag {
            'd' => self.dockerfile_root = Some(PathBuf::from(value)),
            'r' => self.storage_root = Some(value),
            's' => self.script_root = Some(PathBuf::from(value)),
            'h' => self.hosts.push(value),
            _ => {}
        }
    }
}

/// Positional arguments of one entry point.
pub trait Positional: Sized {
    /// Name `-f` selects this resolver by.
    const RESOLVER: &'static str;
    /// Entry point name used in diagnostics.
    const FUNC: &'static str;
    /// Entry point specific flags, each taking a value.
    const EXTRA_FLAGS: &'static [char] = &[];

    fn from_args(args: &[String], extras: &Extras, settings: &Settings) -> Result<Self, Error>;
}

/// The fully resolved arguments of one invocation.
#[derive(Debug, Clone)]
pub struct Resolved<P> {
    pub ctx: InvocationContext,
    pub extras: Extras,
    pub args: P,
}

/// Parses `raw` into an invocation context plus the positionals of `P`.
pub fn resolve<P: Positional>(
    raw: &[String],
    defaults: &Defaults,
    settings: &Settings,
) -> Result<Resolved<P>, Error> {
    let mut ctx = InvocationContext {
        project: defaults.project.clone(),
        zone: defaults.zone.clone(),
        dry_run: false,
    };
    let mut extras = Extras::default();
    let mut arg_func: Option<String> = None;

    let mut i = 0;
    while i < raw.len() {
        let arg = &raw[i];
        if arg == "--" {
            i += 1;
            break;
        }
        let Some(cluster) = arg.strip_prefix('-').filter(|c| !c.is_empty()) else {
            break;
        };
        i += 1;

        let chars: Vec<char> = cluster.chars().collect();
        let mut j = 0;
        while j < chars.len() {
            let flag = chars[j];
            j += 1;

            let takes_value = matches!(flag, 'p' | 'z' | 'f') || P::EXTRA_FLAGS.contains(&flag);
            if flag == 'n' {
                ctx.dry_run = true;
                continue;
            }
            if !takes_value {
                warn!("{}: -{flag}: unknown flag; it's ignored", P::FUNC);
                continue;
            }

            // The rest of the cluster, or else the next argument, is the value.
            let value = if j < chars.len() {
                let v: String = chars[j..].iter().collect();
                j = chars.len();
                Some(v)
            } else if i < raw.len() {
                i += 1;
                Some(raw[i - 1].clone())
            } else {
                None
            };

            match (flag, value.filter(|v| !v.is_empty())) {
                ('f', None) => return Err(Error::ResolverNotProvided),
                ('f', Some(name)) => arg_func = Some(name),
                (_, None) => debug!("{}: -{flag}: no value given; using default", P::FUNC),
                ('p', Some(project)) => ctx.project = project,
                ('z', Some(zone)) => ctx.zone = zone,
                (extra, Some(value)) => extras.set(extra, value),
            }
        }
    }

    if let Some(name) = arg_func {
        check_resolver::<P>(&name)?;
    }

    let args = P::from_args(&raw[i..], &extras, settings)?;
    debug!(func = P::FUNC, ?ctx, "resolved arguments");
    Ok(Resolved { ctx, extras, args })
}

fn check_resolver<P: Positional>(name: &str) -> Result<(), Error> {
    let bare = name.strip_prefix("grpc_").unwrap_or(name);
    if bare == P::RESOLVER {
        Ok(())
    } else if RESOLVERS.contains(&bare) {
        Err(Error::ResolverMismatch {
            func: P::FUNC,
            name: name.to_string(),
        })
    } else {
        Err(Error::ResolverNotDefined(name.to_string()))
    }
}

/// Returns the positional at `idx`, failing if it is absent or empty.
pub(crate) fn required(
    args: &[String],
    idx: usize,
    func: &'static str,
    arg: &'static str,
) -> Result<String, Error> {
    match args.get(idx) {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(Error::MissingArg { func, arg }),
    }
}
