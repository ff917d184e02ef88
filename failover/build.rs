use std::env;
use std::process::Command;

fn git(args: &[&str]) -> String {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn main() {
    // packaging scripts may set these when building outside a checkout
    let commit = env::var("FAILOVER_GIT_COMMIT").unwrap_or_else(|_| git(&["rev-parse", "--short", "HEAD"]));
    let branch = env::var("FAILOVER_GIT_BRANCH").unwrap_or_else(|_| git(&["rev-parse", "--abbrev-ref", "HEAD"]));

    println!("cargo:rustc-env=GIT_COMMIT={}", commit);
    println!("cargo:rustc-env=GIT_BRANCH={}", branch);

    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=../.git/refs");
    println!("cargo:rerun-if-env-changed=FAILOVER_GIT_BRANCH");
    println!("cargo:rerun-if-env-changed=FAILOVER_GIT_COMMIT");
}
