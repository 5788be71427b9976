//! `cd` changes the working directory of the whole process, so it is tested
//! in a binary of its own.

use pipesh::Shell;
use pipesh::config::Config;

#[test]
fn cd_then_pwd() {
    let dir = std::env::temp_dir().join(format!("pipesh_cwd_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let dir = dir.canonicalize().unwrap();

    let mut shell = Shell::new(Config::default_config());
    assert_eq!(shell.run_line(&format!("cd {}", dir.display())).unwrap(), 0);
    assert_eq!(std::env::current_dir().unwrap(), dir);

    assert_eq!(shell.run_line("pwd > cwd.txt").unwrap(), 0);
    let printed = std::fs::read_to_string(dir.join("cwd.txt")).unwrap();
    assert_eq!(printed, format!("{}\n", dir.display()));

    assert_eq!(shell.run_line("cd /nonexistent/pipesh").unwrap(), 1);
    assert_eq!(std::env::current_dir().unwrap(), dir);

    if let Some(home) = std::env::var_os("HOME") {
        let home = std::path::PathBuf::from(home);
        if home.is_dir() {
            assert_eq!(shell.run_line("cd").unwrap(), 0);
            assert_eq!(
                std::env::current_dir().unwrap(),
                home.canonicalize().unwrap()
            );
        }
    }
}
