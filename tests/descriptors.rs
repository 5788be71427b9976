//! Descriptor accounting. Runs in its own process so no other test opens or
//! closes descriptors while the table is being counted.
#![cfg(target_os = "linux")]

use pipesh::Shell;
use pipesh::config::Config;

fn open_fds() -> usize {
    std::fs::read_dir("/proc/self/fd").unwrap().count()
}

fn scratch(tag: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("pipesh_fd_{}_{tag}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn no_descriptor_survives_a_line() {
    let dir = scratch("lines");
    let out = dir.join("out.txt");
    std::fs::write(dir.join("in.txt"), "x\n").unwrap();
    let mut shell = Shell::new(Config::default_config());

    let lines = [
        // rejected after pipes and files were opened
        format!("true | true > {} | true", out.display()),
        format!("true | true > {} > {}", out.display(), out.display()),
        format!("cat < {}/in.txt | true |", dir.display()),
        format!("true 2> {} ; cat < {}/missing", out.display(), dir.display()),
        // executed
        format!("cat < {}/in.txt | wc -c > {}", dir.display(), out.display()),
        format!("false | true > {}", out.display()),
        format!("pipesh-no-such-program | true 2> {}", out.display()),
        format!("history | cat > {}", out.display()),
    ];

    let before = open_fds();
    for line in &lines {
        shell.run_line(line).unwrap();
        assert_eq!(open_fds(), before, "descriptor leak after: {line}");
    }
}
