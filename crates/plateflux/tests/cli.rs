use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn plateflux(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_plateflux"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("run plateflux")
}

fn write_inputs(dir: &Path) {
    fs::write(dir.join("run.csv"), "10,-\n20,21\n\n30,31\n40,41\n").unwrap();
    fs::write(dir.join("key.csv"), "Row,1,2\nA,drugX,drugY\nB,DMSO,buffer\n").unwrap();
}

#[test]
fn grid_run_writes_default_output_with_swaps() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_inputs(dir.path());

    let output = plateflux(
        dir.path(),
        &["run.csv", "key.csv", "-s", "6", "--swap", "1,100,Drug_added"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let text = fs::read_to_string(dir.path().join("processed_run.csv")).expect("output file");
    assert_eq!(
        text,
        "Time,Plate,Row,Column,Condition,Fluorescence\n\
         0,Equilibration,A,1,drugX,10.0\n\
         0,Equilibration,B,1,DMSO,20.0\n\
         0,Equilibration,B,2,buffer,21.0\n\
         106,Drug added,A,1,drugX,30.0\n\
         106,Drug added,A,2,drugY,31.0\n\
         106,Drug added,B,1,DMSO,40.0\n\
         106,Drug added,B,2,buffer,41.0\n"
    );
}

#[test]
fn config_file_and_summary() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_inputs(dir.path());
    fs::write(
        dir.path().join("run.toml"),
        "sampling_interval_s = 10\nlayout = \"grid\"\n\n[[swaps]]\ntrigger = 1\nduration_s = 5\nlabel = \"Washout\"\n",
    )
    .unwrap();

    let output = plateflux(
        dir.path(),
        &["run.csv", "key.csv", "-c", "run.toml", "-o", "out.csv", "--summary"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Washout"));
    assert!(stdout.contains("Equilibration"));

    let text = fs::read_to_string(dir.path().join("out.csv")).expect("output file");
    assert!(text.contains("15,Washout,A,1,drugX,30.0"));
}

#[test]
fn missing_condition_fails_without_output() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_inputs(dir.path());
    fs::write(dir.path().join("key.csv"), "Row,1,2\nA,drugX,drugY\n").unwrap();

    let output = plateflux(dir.path(), &["run.csv", "key.csv"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("B1"));
    assert!(!dir.path().join("processed_run.csv").exists());
}

#[test]
fn malformed_swap_is_a_usage_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_inputs(dir.path());

    let output = plateflux(dir.path(), &["run.csv", "key.csv", "--swap", "one,100,x"]);
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(2));
}
