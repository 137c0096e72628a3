//! End-to-end scenarios: compile a source string with the `nanoc` binary,
//! assemble and link the result against a tiny C driver with `cc`, run the
//! resulting binary, and check its exit code. Skipped (not failed) when
//! `cc` isn't on `PATH`.

use assert_cmd::Command;
use tempfile::TempDir;

fn cc_available() -> bool {
    std::process::Command::new("cc").arg("--version").output().map(|o| o.status.success()).unwrap_or(false)
}

fn run_scenario(source: &str, expected_exit_code: i32) {
    if !cc_available() {
        eprintln!("skipping: no `cc` on PATH");
        return;
    }

    let dir = TempDir::new().unwrap();
    let src_path = dir.path().join("input.c");
    let asm_path = dir.path().join("input.s");
    let bin_path = dir.path().join("program");
    std::fs::write(&src_path, source).unwrap();

    Command::cargo_bin("nanoc")
        .unwrap()
        .arg(&src_path)
        .arg("-o")
        .arg(&asm_path)
        .assert()
        .success();

    let link_status = std::process::Command::new("cc")
        .arg(&asm_path)
        .arg("-o")
        .arg(&bin_path)
        .status()
        .expect("cc should run");
    assert!(link_status.success(), "linking failed for: {source}");

    let run_status = std::process::Command::new(&bin_path).status().expect("program should run");
    assert_eq!(run_status.code(), Some(expected_exit_code), "unexpected exit code for: {source}");
}

#[test]
fn scenario_1_plain_return() {
    run_scenario("int main(void) { return 2; }", 2);
}

#[test]
fn scenario_2_bitwise_complement_and_negate() {
    run_scenario("int main(void){ return -(~0); }", 1);
}

#[test]
fn scenario_3_bitwise_and_shift_operators() {
    run_scenario(
        "int main(void){ int a=12,b=10; if((a&b)!=8)return 1; if((a|b)!=14)return 2; \
         if((a^b)!=6)return 3; if((a<<1)!=24)return 4; if((a>>1)!=6)return 5; return 0; }",
        0,
    );
}

#[test]
fn scenario_4_static_locals_persist_across_calls() {
    run_scenario(
        "int foo(){ static int x=5; x=x+1; return x; } \
         int main(void){ if(foo()!=6)return 1; if(foo()!=7)return 2; if(foo()!=8)return 3; return 0; }",
        0,
    );
}

#[test]
fn scenario_5_long_arithmetic_beyond_32_bits() {
    run_scenario(
        "long foo(){ long x = 4294967296 + 10; return x; } \
         int main(void){ if (foo()==10) return 1; if (foo()>100) return 0; return 2; }",
        0,
    );
}

#[test]
fn scenario_6_conditionals_and_ternary() {
    run_scenario(
        "int main(void){ int r=0; if(1) r=r+1; if(5>4) r=r+1; else r=666; r=(1?r+1:0); return r; }",
        3,
    );
}
