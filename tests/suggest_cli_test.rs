use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn seed_post(home: &Path, post_id: u64, title: &str, content: &str) {
    let posts = home.join("posts");
    fs::create_dir_all(&posts).expect("mkdir posts");
    fs::write(
        posts.join(format!("{post_id}.json")),
        format!(
            "{{\"title\":{},\"content\":{},\"editable\":true,\"meta\":{{}}}}\n",
            serde_json::to_string(title).expect("title json"),
            serde_json::to_string(content).expect("content json"),
        ),
    )
    .expect("write post");
}

#[test]
fn suggest_returns_heuristic_bundle_for_seeded_post() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("assist");
    seed_post(
        &home,
        12,
        "Home",
        "Acme ships enterprise widgets. Learn more about pricing.",
    );

    assert_cmd::cargo::cargo_bin_cmd!("seoassist")
        .current_dir(tmp.path())
        .env("SEO_ASSIST_HOME", &home)
        .args(["suggest", "--post-id", "12"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Acme ships enterprise widgets."))
        .stdout(predicate::str::contains("\"model_used\": \"heuristic\""))
        .stdout(predicate::str::contains("enterprise"))
        .stdout(predicate::str::contains("\"current_meta\""));
}

#[test]
fn suggest_rejects_unknown_post() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("assist");
    fs::create_dir_all(home.join("posts")).expect("mkdir posts");

    assert_cmd::cargo::cargo_bin_cmd!("seoassist")
        .current_dir(tmp.path())
        .env("SEO_ASSIST_HOME", &home)
        .args(["suggest", "--post-id", "44"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"code\": \"forbidden\""));
}

#[test]
fn suggest_fails_when_target_plugin_is_inactive() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("assist");
    seed_post(&home, 12, "Home", "Body.");
    fs::write(
        home.join("options.json"),
        "{\"active_plugins\": [\"yoast\"]}\n",
    )
    .expect("write options");

    assert_cmd::cargo::cargo_bin_cmd!("seoassist")
        .current_dir(tmp.path())
        .env("SEO_ASSIST_HOME", &home)
        .args(["suggest", "--post-id", "12"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"code\": \"tsf_inactive\""))
        .stdout(predicate::str::contains("\"status\": 400"));
}

#[test]
fn openai_model_without_key_fails_with_credential_error() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("assist");
    seed_post(&home, 12, "Home", "Body text here.");

    assert_cmd::cargo::cargo_bin_cmd!("seoassist")
        .current_dir(tmp.path())
        .env("SEO_ASSIST_HOME", &home)
        .env("SEO_ASSIST_MODEL", "openai")
        .args(["suggest", "--post-id", "12"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"code\": \"openai_missing_key\""));
}

#[test]
fn status_reports_paths_and_build() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("assist");
    fs::create_dir_all(home.join("posts")).expect("mkdir posts");

    assert_cmd::cargo::cargo_bin_cmd!("seoassist")
        .current_dir(tmp.path())
        .env("SEO_ASSIST_HOME", &home)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("assist_home="))
        .stdout(predicate::str::contains("build="))
        .stdout(predicate::str::contains("ai_model=heuristic"));
}
