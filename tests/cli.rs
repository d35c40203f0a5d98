use std::fs;
use std::path::PathBuf;
use std::process::Command;

use pretty_assertions::assert_eq;

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("methodopt-{}-{}", std::process::id(), name));
    fs::write(&path, contents).unwrap();
    path
}

fn methodopt(args: &[&str]) -> (bool, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_methodopt"))
        .args(args)
        .output()
        .unwrap();
    (
        output.status.success(),
        String::from_utf8(output.stdout).unwrap(),
        String::from_utf8(output.stderr).unwrap(),
    )
}

const SOURCE: &str = "
; a dead store and a while loop
(method demo.A.f
  (iconst 5) (istore 2)
  (label head) (iload 0) (ifle exit)
  (iinc 0 -1)
  (goto head)
  (label exit) (return))

(func demo.A.g (val x 2) (val y (+ x 3)) (call use y))
";

#[test]
fn optimizes_every_body_in_the_file() {
    let target = write_temp("all.mo", SOURCE);
    let target = target.to_str().unwrap();
    let (ok, stdout, _) = methodopt(&["--target", target, "--remove-unused-stores", "true"]);
    assert!(ok);
    assert_eq!(
        stdout,
        "(method demo.A.f
  (nop)
  (goto L2)
(label L9)
  (iinc 0 -1)
(label L2)
  (iload 0)
  (ifgt L9)
(label L7)
  (return)
)

(func demo.A.g
  (begin)
  (begin)
  (call use 5))

"
    );
}

#[test]
fn config_file_switches_passes_off() {
    let target = write_temp("off.mo", SOURCE);
    let config = write_temp("off.toml", "invert-loops = false\n");
    let (ok, stdout, _) = methodopt(&[
        "--target",
        target.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);
    assert!(ok);
    assert!(stdout.contains("(istore 2)"));
    assert!(stdout.contains("(goto L2)\n(label L7)"));
}

#[test]
fn rejects_unknown_config_keys() {
    let target = write_temp("bad.mo", SOURCE);
    let config = write_temp("bad.toml", "unroll-loops = true\n");
    let (ok, _, stderr) = methodopt(&[
        "--target",
        target.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);
    assert!(!ok);
    assert!(stderr.contains("invalid optimization config"));
}

#[test]
fn switches_accept_only_booleans() {
    let target = write_temp("flags.mo", SOURCE);
    let target = target.to_str().unwrap();
    let (ok, stdout, _) = methodopt(&["--target", target, "--invert-loops", "yes"]);
    assert!(!ok);
    assert!(stdout.is_empty());
    let (ok, _, _) = methodopt(&["--target", target, "--remove-unused-stores", "1"]);
    assert!(!ok);
    let (ok, _, _) = methodopt(&["--target", target, "--invert-loops", "false"]);
    assert!(ok);
}
