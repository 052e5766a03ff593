use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use guestmount::identity::resolve_default_ids;
use guestmount::materialize::plan;
use guestmount::ownership::{GuestOwner, query_owner};
use guestmount::preflight::check_dependency_present;
use guestmount::{DefaultIdentity, MountOptions, OpenSshSession, TracingSink};

use crate::cli::GlobalFlags;

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Guest to probe (`user@host` or an ssh config alias)
    pub destination: String,

    /// Guest directory that would be mounted; reports which parts are missing
    #[arg(short, long)]
    pub target: Option<String>,

    /// ssh port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// ssh identity file
    #[arg(short, long)]
    pub identity: Option<PathBuf>,

    /// Mount options file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Seconds to wait for the ssh connection
    #[arg(long, default_value_t = 10)]
    pub connect_timeout: u32,

    /// ssh client binary
    #[arg(long, default_value = "ssh")]
    pub ssh: PathBuf,
}

impl ProbeArgs {
    fn session(&self) -> OpenSshSession {
        let mut session = OpenSshSession::new(&self.destination)
            .with_connect_timeout(self.connect_timeout)
            .with_ssh_binary(&self.ssh);
        if let Some(port) = self.port {
            session = session.with_port(port);
        }
        if let Some(identity) = &self.identity {
            session = session.with_identity_file(identity);
        }
        session
    }
}

/// What a probe learned about the guest.
#[derive(Debug)]
struct ProbeReport {
    helper: String,
    identity: DefaultIdentity,
    owner: GuestOwner,
    missing: Option<Vec<String>>,
}

pub async fn execute(args: ProbeArgs, global: &GlobalFlags) -> Result<()> {
    let options = global.load_options(args.config.as_deref())?;
    let session = args.session();
    let target = args.target.clone();

    tracing::debug!(destination = %args.destination, "probing guest");
    let report = tokio::task::spawn_blocking(move || probe(session, &options, target.as_deref()))
        .await
        .context("probe task failed")??;

    println!("Helper:   {} (installed)", report.helper);
    println!(
        "Identity: uid={} gid={}",
        report.identity.uid, report.identity.gid
    );
    println!("Owner:    {}:{}", report.owner.user, report.owner.group);
    if let Some(missing) = report.missing {
        if missing.is_empty() {
            println!("Target:   exists");
        } else {
            println!("Target:   would create {}", missing.join(", "));
        }
    }

    Ok(())
}

fn probe(
    mut session: OpenSshSession,
    options: &MountOptions,
    target: Option<&str>,
) -> Result<ProbeReport> {
    let log = TracingSink;
    let commands = options.commands();

    check_dependency_present(&mut session, &commands, &options.helper, &log)?;
    let identity = resolve_default_ids(&mut session, &commands, &log)?;
    let owner = query_owner(&mut session, &commands)?;
    let missing = target
        .map(|target| plan(&mut session, target, &commands, options.existence_probe))
        .transpose()?;

    Ok(ProbeReport {
        helper: options.helper.clone(),
        identity,
        owner,
        missing,
    })
}
