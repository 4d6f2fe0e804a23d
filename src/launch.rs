//! Start simulator processes for every requested size.
//!
//! Each repeat starts one `waf --run` child per size, then waits for the whole
//! batch before the next repeat. Output goes to
//! `<results>/<experiment>/<size>/<run_index>`.

use anyhow::{Context, bail};
use regex::Regex;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    /// Program under `scratch/`, e.g. `hyper`.
    pub experiment_file: String,
    pub experiment_name: String,
    /// None: children write to the console.
    pub results_dir: Option<PathBuf>,
    pub repeats: usize,
    pub sizes: Vec<u32>,
    /// `key=value` pairs passed as `--key=value`.
    pub extra_args: Vec<String>,
    pub waf: PathBuf,
    /// Pause after each spawn so concurrent waf builds do not collide.
    pub stagger: Duration,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaunchSummary {
    pub spawned: usize,
    pub failed: usize,
    pub timed_out: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Exited(ExitStatus),
    TimedOut,
}

/// Parse `8,16,32`.
pub fn parse_sizes(s: &str) -> anyhow::Result<Vec<u32>> {
    let mut sizes = Vec::new();
    for part in s.split(',') {
        let p = part.trim();
        if p.is_empty() {
            continue;
        }
        sizes.push(
            p.parse::<u32>()
                .with_context(|| format!("bad experiment size {:?}", p))?,
        );
    }
    if sizes.is_empty() {
        bail!("no experiment sizes in {:?}", s);
    }
    Ok(sizes)
}

/// Parse `comp_factor=2,cluster=2`.
pub fn parse_extra_args(s: &str) -> anyhow::Result<Vec<String>> {
    let re = Regex::new(r#"^[A-Za-z_][\w-]*=\S+$"#)?;
    let mut args = Vec::new();
    for part in s.split(',') {
        let p = part.trim();
        if p.is_empty() {
            continue;
        }
        if !re.is_match(p) {
            bail!("extra argument must look like key=value: {:?}", p);
        }
        args.push(p.to_string());
    }
    Ok(args)
}

/// `<waf> --run "scratch/<file> [--results=<dir>] --N=<size> [--key=value ...]"`.
///
/// waf takes the program and its arguments as one string.
pub fn simulation_command(plan: &LaunchPlan, size: u32) -> Command {
    let mut target = format!("scratch/{}", plan.experiment_file);
    if let Some(dir) = &plan.results_dir {
        target.push_str(&format!(" --results={}", dir.display()));
    }
    target.push_str(&format!(" --N={}", size));
    for arg in &plan.extra_args {
        target.push_str(&format!(" --{}", arg));
    }

    let mut cmd = Command::new(&plan.waf);
    cmd.arg("--run").arg(target);
    cmd
}

/// Next free run index in a size directory: the number of entries in it.
pub fn next_output_path(size_dir: &Path) -> anyhow::Result<PathBuf> {
    let count = fs::read_dir(size_dir)
        .with_context(|| format!("read dir {}", size_dir.display()))?
        .count();
    Ok(size_dir.join(count.to_string()))
}

/// Wait for `child`, killing it once `deadline` passes.
pub fn wait_child(child: &mut Child, deadline: Option<Instant>) -> std::io::Result<Outcome> {
    let Some(deadline) = deadline else {
        return child.wait().map(Outcome::Exited);
    };
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Outcome::Exited(status));
        }
        if Instant::now() >= deadline {
            child.kill()?;
            child.wait()?;
            return Ok(Outcome::TimedOut);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

struct Launched {
    size: u32,
    output: Option<PathBuf>,
    child: Child,
    deadline: Option<Instant>,
}

fn spawn_one(plan: &LaunchPlan, size: u32) -> anyhow::Result<Launched> {
    let mut cmd = simulation_command(plan, size);

    let output = match &plan.results_dir {
        Some(dir) => {
            let size_dir = dir.join(&plan.experiment_name).join(size.to_string());
            fs::create_dir_all(&size_dir)
                .with_context(|| format!("create {}", size_dir.display()))?;
            let path = next_output_path(&size_dir)?;
            let file =
                File::create(&path).with_context(|| format!("create {}", path.display()))?;
            let err = file
                .try_clone()
                .with_context(|| format!("clone handle for {}", path.display()))?;
            cmd.stdout(Stdio::from(file)).stderr(Stdio::from(err));
            Some(path)
        }
        None => None,
    };

    info!("size {}: {:?}", size, cmd);
    let child = cmd
        .spawn()
        .with_context(|| format!("spawn {} for size {}", plan.waf.display(), size))?;

    Ok(Launched {
        size,
        output,
        child,
        deadline: plan.timeout.map(|t| Instant::now() + t),
    })
}

/// Kill and reap a partly spawned batch.
fn abandon(batch: Vec<Launched>) {
    for mut launched in batch {
        if let Err(e) = launched.child.kill().and_then(|_| launched.child.wait()) {
            warn!("size {}: could not stop simulator: {}", launched.size, e);
        }
    }
}

/// Run every repeat of the plan. Failing children are only logged; their
/// broken output shows up when the logs are extracted.
pub fn run(plan: &LaunchPlan) -> anyhow::Result<LaunchSummary> {
    let mut summary = LaunchSummary::default();

    for repeat in 0..plan.repeats {
        info!("starting set {} of experiments", repeat);

        let mut batch = Vec::with_capacity(plan.sizes.len());
        for &size in &plan.sizes {
            match spawn_one(plan, size) {
                Ok(launched) => batch.push(launched),
                Err(e) => {
                    warn!("set {}: stopping {} running simulators", repeat, batch.len());
                    abandon(batch);
                    return Err(e);
                }
            }
            summary.spawned += 1;
            thread::sleep(plan.stagger);
        }

        info!("waiting for set {} to complete", repeat);
        for mut launched in batch {
            let outcome = wait_child(&mut launched.child, launched.deadline)
                .with_context(|| format!("wait for size {}", launched.size))?;
            let where_to = launched
                .output
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "console".to_string());
            match outcome {
                Outcome::Exited(status) if status.success() => {}
                Outcome::Exited(status) => {
                    summary.failed += 1;
                    warn!("size {}: simulator exited with {} ({})", launched.size, status, where_to);
                }
                Outcome::TimedOut => {
                    summary.timed_out += 1;
                    warn!("size {}: simulator killed after timeout ({})", launched.size, where_to);
                }
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn plan(results_dir: Option<PathBuf>) -> LaunchPlan {
        LaunchPlan {
            experiment_file: "hyper".to_string(),
            experiment_name: "hyper-c2".to_string(),
            results_dir,
            repeats: 1,
            sizes: vec![4, 8],
            extra_args: vec!["C=2".to_string(), "group=1".to_string()],
            waf: PathBuf::from("./waf"),
            stagger: Duration::ZERO,
            timeout: None,
        }
    }

    #[test]
    fn parses_sizes_and_args() {
        assert_eq!(parse_sizes("8, 16,32").unwrap(), vec![8, 16, 32]);
        assert!(parse_sizes("8,x").is_err());
        assert!(parse_sizes(" , ").is_err());

        assert_eq!(
            parse_extra_args("comp_factor=2, cluster=2").unwrap(),
            vec!["comp_factor=2", "cluster=2"]
        );
        assert!(parse_extra_args("cluster").is_err());
        assert!(parse_extra_args("=2").is_err());
        assert_eq!(parse_extra_args("").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn builds_waf_command_line() {
        let cmd = simulation_command(&plan(Some(PathBuf::from("out"))), 16);
        assert_eq!(cmd.get_program(), "./waf");
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec!["--run", "scratch/hyper --results=out --N=16 --C=2 --group=1"]
        );

        let cmd = simulation_command(&plan(None), 4);
        let target = cmd.get_args().nth(1).unwrap().to_string_lossy().into_owned();
        assert_eq!(target, "scratch/hyper --N=4 --C=2 --group=1");
    }

    #[test]
    fn run_index_counts_existing_entries() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(next_output_path(tmp.path()).unwrap(), tmp.path().join("0"));
        fs::write(tmp.path().join("0"), "").unwrap();
        fs::write(tmp.path().join("1"), "").unwrap();
        assert_eq!(next_output_path(tmp.path()).unwrap(), tmp.path().join("2"));
    }

    #[cfg(unix)]
    #[test]
    fn writes_one_log_per_size_and_repeat() {
        let tmp = tempfile::tempdir().unwrap();
        let plan = LaunchPlan {
            waf: PathBuf::from("echo"),
            repeats: 2,
            ..plan(Some(tmp.path().to_path_buf()))
        };

        let summary = run(&plan).unwrap();
        assert_eq!(
            summary,
            LaunchSummary {
                spawned: 4,
                failed: 0,
                timed_out: 0
            }
        );

        let size_dir = tmp.path().join("hyper-c2").join("8");
        let second = fs::read_to_string(size_dir.join("1")).unwrap();
        assert_eq!(
            second.trim_end(),
            format!(
                "--run scratch/hyper --results={} --N=8 --C=2 --group=1",
                tmp.path().display()
            )
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn abandoned_batch_is_killed_and_reaped() {
        let mut batch = Vec::new();
        let mut pids = Vec::new();
        for size in [4, 8] {
            let child = Command::new("sleep").arg("30").spawn().unwrap();
            pids.push(child.id());
            batch.push(Launched {
                size,
                output: None,
                child,
                deadline: None,
            });
        }

        abandon(batch);
        for pid in pids {
            assert!(!Path::new(&format!("/proc/{}", pid)).exists());
        }
    }

    #[cfg(unix)]
    #[test]
    fn failed_spawn_stops_the_run() {
        let tmp = tempfile::tempdir().unwrap();
        let exp = tmp.path().join("hyper-c2");
        fs::create_dir_all(&exp).unwrap();
        // A file where the size-8 directory should go.
        fs::write(exp.join("8"), "").unwrap();

        let plan = LaunchPlan {
            waf: PathBuf::from("echo"),
            ..plan(Some(tmp.path().to_path_buf()))
        };
        let err = run(&plan).unwrap_err();
        assert!(format!("{:#}", err).contains("hyper-c2/8"));
        assert!(exp.join("4").join("0").exists());
    }

    #[cfg(unix)]
    #[test]
    fn kills_children_past_deadline() {
        let mut child = Command::new("sleep").arg("5").spawn().unwrap();
        let deadline = Instant::now() + Duration::from_millis(100);
        assert_eq!(wait_child(&mut child, Some(deadline)).unwrap(), Outcome::TimedOut);

        let mut child = Command::new("true").spawn().unwrap();
        match wait_child(&mut child, None).unwrap() {
            Outcome::Exited(status) => assert!(status.success()),
            Outcome::TimedOut => panic!("no deadline was set"),
        }
    }
}
