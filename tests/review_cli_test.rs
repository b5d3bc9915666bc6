use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn seed_post(home: &Path, post_id: u64) {
    let posts = home.join("posts");
    fs::create_dir_all(&posts).expect("mkdir posts");
    fs::write(
        posts.join(format!("{post_id}.json")),
        "{\"title\":\"Home\",\"content\":\"Acme ships enterprise widgets. Learn more about pricing.\",\"editable\":true,\"meta\":{}}\n",
    )
    .expect("write post");
}

#[test]
fn review_fetches_and_reports_default_apply_flags() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("assist");
    seed_post(&home, 21);

    assert_cmd::cargo::cargo_bin_cmd!("seoassist")
        .current_dir(tmp.path())
        .env("SEO_ASSIST_HOME", &home)
        .args(["review", "--post-id", "21"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"meta_title\": \"Home | ships\""))
        .stdout(predicate::str::contains("\"meta_title\": true"))
        .stdout(predicate::str::contains("\"mirrored\": []"));
}

#[test]
fn review_apply_mirrors_fields_and_writes_meta() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("assist");
    seed_post(&home, 21);

    assert_cmd::cargo::cargo_bin_cmd!("seoassist")
        .current_dir(tmp.path())
        .env("SEO_ASSIST_HOME", &home)
        .args([
            "review",
            "--post-id",
            "21",
            "--apply",
            "--skip",
            "twitter_title",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("SEO fields updated."))
        .stdout(predicate::str::contains("\"mirrored\""))
        .stdout(predicate::str::contains("meta_title"));

    let raw = fs::read_to_string(home.join("posts/21.json")).expect("read post");
    assert!(raw.contains("\"_genesis_title\": \"Home | ships\""));
    assert!(raw.contains("\"_genesis_description\""));
    // Skipped field never reached the store.
    assert!(!raw.contains("_twitter_title"));
}

#[test]
fn review_refresh_regenerates_after_content_change() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("assist");
    seed_post(&home, 21);

    assert_cmd::cargo::cargo_bin_cmd!("seoassist")
        .current_dir(tmp.path())
        .env("SEO_ASSIST_HOME", &home)
        .args(["review", "--post-id", "21"])
        .assert()
        .success();

    fs::write(
        home.join("posts/21.json"),
        "{\"title\":\"Home\",\"content\":\"Fresh copy about analytics dashboards. More below.\",\"editable\":true,\"meta\":{}}\n",
    )
    .expect("rewrite post");

    assert_cmd::cargo::cargo_bin_cmd!("seoassist")
        .current_dir(tmp.path())
        .env("SEO_ASSIST_HOME", &home)
        .args(["review", "--post-id", "21", "--refresh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("analytics dashboards"));
}

#[test]
fn review_rejects_unknown_skip_field() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("assist");
    seed_post(&home, 21);

    assert_cmd::cargo::cargo_bin_cmd!("seoassist")
        .current_dir(tmp.path())
        .env("SEO_ASSIST_HOME", &home)
        .args(["review", "--post-id", "21", "--skip", "made_up"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown field"));
}
