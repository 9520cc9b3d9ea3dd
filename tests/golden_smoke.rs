// tests/golden_smoke.rs
use std::process::Command;

#[test]
fn golden_smoke_aggregates_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let out_path = tmp.path().join("cheapest.csv");

    std::fs::write(tmp.path().join("east.csv"), "7,lamp,used,NY,10.5\n2,desk,new,CA,3.25\n")
        .unwrap();
    std::fs::write(tmp.path().join("west.csv"), "9,chair,new,TX,6.75\n").unwrap();
    std::fs::write(tmp.path().join("north.csv"), "7,lamp,used,NY,10.5\n").unwrap();
    // not a .csv file: must be ignored by discovery
    std::fs::write(tmp.path().join("notes.txt"), "1,noise,x,y,0.01\n").unwrap();

    let exe = env!("CARGO_BIN_EXE_cheapest-products");
    let status = Command::new(exe)
        .args([
            "--dir",
            tmp.path().to_str().unwrap(),
            "--out",
            out_path.to_str().unwrap(),
            "--result-rows",
            "3",
            "--duplicate-cap",
            "2",
        ])
        .status()
        .unwrap();
    assert!(status.success());

    let out = std::fs::read_to_string(&out_path).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec!["2,desk,new,CA,3.25", "9,chair,new,TX,6.75", "7,lamp,used,NY,10.5"]
    );

    // rerun without --overwrite: the existing output is a conflict
    let status = Command::new(exe)
        .args([
            "--dir",
            tmp.path().to_str().unwrap(),
            "--out",
            out_path.to_str().unwrap(),
        ])
        .status()
        .unwrap();
    assert!(!status.success());
    assert_eq!(std::fs::read_to_string(&out_path).unwrap(), out);

    // rerun with --overwrite: replaced cleanly
    let status = Command::new(exe)
        .args([
            "--dir",
            tmp.path().to_str().unwrap(),
            "--out",
            out_path.to_str().unwrap(),
            "--result-rows",
            "3",
            "--duplicate-cap",
            "2",
            "--overwrite",
        ])
        .status()
        .unwrap();
    assert!(status.success());
    assert_eq!(std::fs::read_to_string(&out_path).unwrap(), out);
}
