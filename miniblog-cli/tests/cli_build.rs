use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn init_then_build_writes_the_site() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    #[allow(deprecated)]
    Command::cargo_bin("miniblog")?
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("miniblog initialized"));

    fs::write(dir.path().join("media/style.css"), "body {}")?;

    #[allow(deprecated)]
    Command::cargo_bin("miniblog")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 3 pages and 1 media files"));

    let out = dir.path().join("out");
    let post = fs::read_to_string(out.join("blog/hello-world/index.html"))?;
    assert!(post.contains("Hello, world"));
    assert!(out.join("category/index.html").exists());
    assert!(out.join("category/general/index.html").exists());
    assert_eq!(fs::read_to_string(out.join("media/style.css"))?, "body {}");

    Ok(())
}

#[test]
fn build_without_config_uses_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let content = dir.path().join("content");
    fs::create_dir_all(&content)?;
    fs::write(content.join("about.md"), "About me")?;
    fs::write(content.join("about.md.meta"), "title: About\npath: /about/\nstatic: true")?;

    #[allow(deprecated)]
    Command::cargo_bin("miniblog")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .success();

    let about = fs::read_to_string(dir.path().join("out/about/index.html"))?;
    assert!(about.contains("About me"));
    Ok(())
}

#[test]
fn build_reports_missing_sidecar() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let content = dir.path().join("content");
    fs::create_dir_all(&content)?;
    fs::write(content.join("orphan.md"), "no metadata")?;

    #[allow(deprecated)]
    Command::cargo_bin("miniblog")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("orphan.md"));

    assert!(!dir.path().join("out").exists());
    Ok(())
}

#[test]
fn build_honours_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let site = dir.path().join("site");
    fs::create_dir_all(site.join("posts"))?;
    fs::write(site.join("posts/note.md"), "A note")?;
    fs::write(site.join("posts/note.md.meta"), "title: Note")?;
    fs::write(
        site.join("blog.yml"),
        r#"
paths:
  content: posts
  output: public
content:
  url_pattern: "/notes/{slug}.html"
"#,
    )?;

    #[allow(deprecated)]
    Command::cargo_bin("miniblog")?
        .current_dir(dir.path())
        .args(["--config", "site/blog.yml", "build"])
        .assert()
        .success();

    assert!(site.join("public/notes/note.html").exists());
    Ok(())
}
