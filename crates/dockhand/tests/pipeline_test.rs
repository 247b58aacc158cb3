use std::fs;
use std::path::{Path, PathBuf};

use dockhand::DockhandConfig;
use dockhand::pipeline::{self, PipelineError, PipelineState, RunOutcome, RunRequest};
use dockhand::tools::{CheckoutSpec, DeployTools, ToolError};
use mockall::{Sequence, mock};
use secrecy::SecretString;
use tempfile::TempDir;

mock! {
    Tools {}

    impl DeployTools for Tools {
        async fn remote_url(&self, repo_dir: &Path) -> Result<String, ToolError>;
        async fn checkout(&self, spec: &CheckoutSpec) -> Result<(), ToolError>;
        async fn build(
            &self,
            descriptor: &Path,
            workdir: &Path,
            env: &[(String, String)],
        ) -> Result<(), ToolError>;
        async fn login(
            &self,
            registry: &str,
            user: &str,
            secret: &SecretString,
        ) -> Result<(), ToolError>;
        async fn stop(&self, descriptor: &Path) -> Result<(), ToolError>;
        async fn start(&self, descriptor: &Path) -> Result<(), ToolError>;
        async fn push(&self, image_ref: &str) -> Result<(), ToolError>;
        async fn prune_dangling(&self) -> Result<(), ToolError>;
    }
}

const REPO: &str = "git@github.com:AcmeCo/My-App.git";
const COMPOSE: &str = "services:\n  web:\n    image: ${DOCKHAND_IMAGE}\n";

fn tool_failure(what: &str) -> ToolError {
    ToolError::CommandFailed {
        command: what.to_owned(),
        stderr: "exit code: exit status: 1".to_owned(),
    }
}

/// Which calls succeed. Every call is allowed any number of times.
struct Script {
    repo_files: &'static [&'static str],
    build_ok: bool,
    stop_ok: bool,
    start_ok: bool,
    push_ok: bool,
    prune_ok: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            repo_files: &["docker-compose.yml", ".env.local"],
            build_ok: true,
            stop_ok: true,
            start_ok: true,
            push_ok: true,
            prune_ok: true,
        }
    }
}

fn scripted(script: Script) -> MockTools {
    let mut tools = MockTools::new();
    let files = script.repo_files;

    tools.expect_remote_url().never();
    tools.expect_checkout().returning(move |spec| {
        for file in files {
            let body = if *file == "docker-compose.yml" { COMPOSE } else { "X=1\n" };
            fs::write(spec.dest.join(file), body).unwrap();
        }
        Ok(())
    });
    tools.expect_build().returning(move |_, _, _| {
        if script.build_ok { Ok(()) } else { Err(tool_failure("docker compose build")) }
    });
    tools.expect_stop().returning(move |_| {
        if script.stop_ok { Ok(()) } else { Err(tool_failure("docker compose down")) }
    });
    tools.expect_start().returning(move |_| {
        if script.start_ok { Ok(()) } else { Err(tool_failure("docker compose up")) }
    });
    tools.expect_push().returning(move |_| {
        if script.push_ok { Ok(()) } else { Err(tool_failure("docker push")) }
    });
    tools.expect_prune_dangling().returning(move || {
        if script.prune_ok { Ok(()) } else { Err(tool_failure("docker image prune")) }
    });
    tools
}

fn config(base: &Path) -> DockhandConfig {
    let mut config = DockhandConfig::default();
    config.project.repo_url = Some(REPO.to_owned());
    config.project.base_dir = base.to_path_buf();
    config
}

fn request(base: &Path) -> RunRequest {
    let mut request = RunRequest::new(config(base), "main", "42");
    request.tag = Some("v1".to_owned());
    request
}

fn project_dir(base: &TempDir) -> PathBuf {
    base.path().join("my-app")
}

fn failure_message(outcome: &RunOutcome) -> &str {
    match outcome {
        RunOutcome::Failed { message, .. } => message,
        other => panic!("expected failure, got {other:?}"),
    }
}

// ── Successful runs ──

#[tokio::test]
async fn successful_run_visits_every_state_in_order() {
    let base = TempDir::new().unwrap();
    let tools = scripted(Script::default());

    let report = pipeline::run(&tools, &request(base.path())).await;

    assert_eq!(report.outcome, RunOutcome::Succeeded);
    assert_eq!(
        report.states,
        [
            PipelineState::Resolving,
            PipelineState::Staging,
            PipelineState::Cloning,
            PipelineState::Building,
            PipelineState::Promoting,
            PipelineState::Stopping,
            PipelineState::Starting,
            PipelineState::Publishing,
            PipelineState::Pruning,
            PipelineState::Done,
        ]
    );
    assert_eq!(report.final_state(), PipelineState::Done);
    assert!(report.warnings.is_empty());
    assert_eq!(report.image.as_deref(), Some("ghcr.io/acmeco/my-app:v1"));
}

#[tokio::test]
async fn successful_run_promotes_artifacts_and_removes_staging() {
    let base = TempDir::new().unwrap();
    let tools = scripted(Script::default());

    let report = pipeline::run(&tools, &request(base.path())).await;

    let project = project_dir(&base);
    let promotion = report.promotion.unwrap();
    assert_eq!(promotion.moved, ["docker-compose.yml", ".env.local"]);
    assert_eq!(promotion.skipped, [".env", "credentials.json"]);
    assert_eq!(
        fs::read_to_string(project.join("docker-compose.yml")).unwrap(),
        COMPOSE
    );
    assert!(!project.join(".tmp_42").exists());
    assert!(report.cleanup.is_clean());
    assert_eq!(report.cleanup.removed, [project.join(".tmp_42")]);
}

#[tokio::test]
async fn build_sees_staging_paths_and_image_coordinates() {
    let base = TempDir::new().unwrap();
    let expected = project_dir(&base).join(".tmp_42");
    let mut tools = MockTools::new();

    tools.expect_checkout().returning(|spec| {
        fs::write(spec.dest.join("docker-compose.yml"), COMPOSE).unwrap();
        Ok(())
    });
    tools
        .expect_build()
        .withf(move |descriptor, workdir, env| {
            descriptor == expected.join("docker-compose.yml")
                && workdir == expected
                && env.contains(&(
                    "DOCKHAND_IMAGE".to_owned(),
                    "ghcr.io/acmeco/my-app:v1".to_owned(),
                ))
        })
        .times(1)
        .returning(|_, _, _| Ok(()));
    tools.expect_stop().returning(|_| Ok(()));
    tools.expect_start().returning(|_| Ok(()));
    tools.expect_push().returning(|_| Ok(()));
    tools.expect_prune_dangling().returning(|| Ok(()));

    let report = pipeline::run(&tools, &request(base.path())).await;

    assert_eq!(report.outcome, RunOutcome::Succeeded);
}

#[tokio::test]
async fn relative_base_dir_is_taken_from_workdir() {
    let workdir = TempDir::new().unwrap();
    let project = workdir.path().join("deploy/my-app");
    let descriptor = project.join("docker-compose.yml");
    let staged = project.join(".tmp_42/docker-compose.yml");
    let mut tools = MockTools::new();

    tools.expect_checkout().returning(|spec| {
        fs::write(spec.dest.join("docker-compose.yml"), COMPOSE).unwrap();
        Ok(())
    });
    tools
        .expect_build()
        .withf(move |path, _, _| path == staged)
        .times(1)
        .returning(|_, _, _| Ok(()));
    let expected = descriptor.clone();
    tools
        .expect_stop()
        .withf(move |path| path == expected)
        .times(1)
        .returning(|_| Ok(()));
    let expected = descriptor.clone();
    tools
        .expect_start()
        .withf(move |path| path == expected)
        .times(1)
        .returning(|_| Ok(()));
    tools.expect_push().returning(|_| Ok(()));
    tools.expect_prune_dangling().returning(|| Ok(()));

    let mut request = request(Path::new("deploy"));
    request.workdir = workdir.path().to_path_buf();

    let report = pipeline::run(&tools, &request).await;

    assert_eq!(report.outcome, RunOutcome::Succeeded);
    assert!(descriptor.is_absolute());
    assert!(descriptor.is_file());
    assert!(!project.join(".tmp_42").exists());
}

#[tokio::test]
async fn checkout_uses_configured_ref_and_key() {
    let base = TempDir::new().unwrap();
    let mut tools = MockTools::new();

    tools
        .expect_checkout()
        .withf(|spec| {
            spec.url == REPO
                && spec.git_ref == "release-1"
                && spec.dest.ends_with("my-app/.tmp_42")
                && spec.ssh_key.as_deref() == Some(Path::new("/keys/deploy"))
        })
        .times(1)
        .returning(|_| Err(tool_failure("git clone")));

    let mut request = request(base.path());
    request.git_ref = Some("release-1".to_owned());
    request.config.secrets.ssh_key = Some(PathBuf::from("/keys/deploy"));

    let report = pipeline::run(&tools, &request).await;

    assert!(matches!(report.error, Some(PipelineError::Checkout { .. })));
    assert!(failure_message(&report.outcome).starts_with("checkout failed"));
}

#[tokio::test]
async fn remote_is_discovered_when_not_configured() {
    let base = TempDir::new().unwrap();
    let mut tools = MockTools::new();

    tools
        .expect_remote_url()
        .withf(|dir| dir == Path::new("/work/checkout"))
        .times(1)
        .returning(|_| Ok("https://github.com/AcmeCo/Other-App".to_owned()));
    tools
        .expect_checkout()
        .withf(|spec| spec.url == "https://github.com/AcmeCo/Other-App")
        .returning(|_| Err(tool_failure("git clone")));

    let mut request = request(base.path());
    request.config.project.repo_url = None;
    request.workdir = PathBuf::from("/work/checkout");

    let report = pipeline::run(&tools, &request).await;

    assert_eq!(report.final_state(), PipelineState::Failed);
    assert!(base.path().join("other-app").is_dir());
    assert!(!base.path().join("other-app/.tmp_42").exists());
}

#[tokio::test]
async fn secrets_are_placed_and_promoted() {
    let base = TempDir::new().unwrap();
    let secrets = TempDir::new().unwrap();
    let env_source = secrets.path().join("prod.env");
    fs::write(&env_source, "DATABASE_URL=postgres://secret\n").unwrap();

    let tools = scripted(Script::default());
    let mut request = request(base.path());
    request.config.secrets.env_file = Some(env_source);

    let report = pipeline::run(&tools, &request).await;

    assert_eq!(report.outcome, RunOutcome::Succeeded);
    let promoted = project_dir(&base).join(".env");
    assert_eq!(
        fs::read_to_string(&promoted).unwrap(),
        "DATABASE_URL=postgres://secret\n"
    );
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&promoted).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[tokio::test]
async fn missing_secret_source_is_fatal() {
    let base = TempDir::new().unwrap();
    let tools = scripted(Script::default());
    let mut request = request(base.path());
    request.config.secrets.credentials_file = Some(base.path().join("absent.json"));

    let report = pipeline::run(&tools, &request).await;

    assert!(matches!(
        report.outcome,
        RunOutcome::Failed { state: PipelineState::Cloning, .. }
    ));
    assert!(matches!(
        report.error,
        Some(PipelineError::SecretPlacement { .. })
    ));
    assert!(!project_dir(&base).join(".tmp_42").exists());
}

// ── Branch guard ──

#[tokio::test]
async fn wrong_branch_is_skipped_before_any_side_effect() {
    let base = TempDir::new().unwrap();
    let tools = MockTools::new();
    let mut request = request(base.path());
    request.branch = "feature-x".to_owned();

    let report = pipeline::run(&tools, &request).await;

    assert_eq!(
        report.outcome,
        RunOutcome::Skipped {
            branch: "feature-x".to_owned(),
            designated: "main".to_owned(),
        }
    );
    assert_eq!(
        report.states,
        [PipelineState::Resolving, PipelineState::Skipped]
    );
    assert!(!report.is_failure());
    assert!(!project_dir(&base).exists());
    assert!(report.cleanup.removed.is_empty());
}

#[tokio::test]
async fn designated_branch_comes_from_config() {
    let base = TempDir::new().unwrap();
    let tools = scripted(Script::default());
    let mut request = request(base.path());
    request.config.project.branch = "production".to_owned();
    request.branch = "production".to_owned();

    let report = pipeline::run(&tools, &request).await;

    assert_eq!(report.outcome, RunOutcome::Succeeded);
}

// ── Resolution failures ──

#[tokio::test]
async fn malformed_url_fails_while_resolving() {
    let base = TempDir::new().unwrap();
    let tools = MockTools::new();
    let mut request = request(base.path());
    request.config.project.repo_url = Some("not-a-remote".to_owned());

    let report = pipeline::run(&tools, &request).await;

    assert!(matches!(
        report.outcome,
        RunOutcome::Failed { state: PipelineState::Resolving, .. }
    ));
    assert!(failure_message(&report.outcome).contains("malformed repository URL"));
    assert!(fs::read_dir(base.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn escaping_run_id_is_rejected() {
    let base = TempDir::new().unwrap();
    let tools = MockTools::new();
    let mut request = request(base.path());
    request.run_id = "../../etc".to_owned();

    let report = pipeline::run(&tools, &request).await;

    assert!(matches!(report.error, Some(PipelineError::Resolve { .. })));
    assert!(!project_dir(&base).exists());
}

// ── Fatal steps ──

#[tokio::test]
async fn missing_descriptor_fails_build_and_cleans_up() {
    let base = TempDir::new().unwrap();
    let tools = scripted(Script {
        repo_files: &[".env.local"],
        ..Script::default()
    });

    let report = pipeline::run(&tools, &request(base.path())).await;

    assert!(matches!(
        report.outcome,
        RunOutcome::Failed { state: PipelineState::Building, .. }
    ));
    assert!(
        failure_message(&report.outcome).starts_with("build failed: missing stack descriptor at")
    );
    assert!(report.promotion.is_none());
    assert!(project_dir(&base).is_dir());
    assert!(!project_dir(&base).join(".tmp_42").exists());
    assert!(!project_dir(&base).join(".env.local").exists());
}

#[tokio::test]
async fn build_failure_leaves_project_untouched() {
    let base = TempDir::new().unwrap();
    let project = project_dir(&base);
    fs::create_dir_all(&project).unwrap();
    fs::write(project.join("docker-compose.yml"), "previous\n").unwrap();
    let tools = scripted(Script {
        build_ok: false,
        ..Script::default()
    });

    let report = pipeline::run(&tools, &request(base.path())).await;

    assert!(matches!(report.error, Some(PipelineError::Build { .. })));
    assert_eq!(
        fs::read_to_string(project.join("docker-compose.yml")).unwrap(),
        "previous\n"
    );
    assert!(!project.join(".tmp_42").exists());
}

#[tokio::test]
async fn start_failure_is_fatal() {
    let base = TempDir::new().unwrap();
    let tools = scripted(Script {
        start_ok: false,
        ..Script::default()
    });

    let report = pipeline::run(&tools, &request(base.path())).await;

    assert!(matches!(
        report.outcome,
        RunOutcome::Failed { state: PipelineState::Starting, .. }
    ));
    assert!(report.image.is_none());
    assert_eq!(report.states.last(), Some(&PipelineState::Failed));
}

#[tokio::test]
async fn missing_tag_fails_publish_naming_the_field() {
    let base = TempDir::new().unwrap();
    let tools = scripted(Script::default());
    let mut request = request(base.path());
    request.tag = None;

    let report = pipeline::run(&tools, &request).await;

    assert!(matches!(
        report.outcome,
        RunOutcome::Failed { state: PipelineState::Publishing, .. }
    ));
    assert_eq!(
        failure_message(&report.outcome),
        "publish failed: missing tag"
    );
    assert!(matches!(report.error, Some(PipelineError::MissingField("tag"))));
}

#[tokio::test]
async fn push_failure_is_fatal() {
    let base = TempDir::new().unwrap();
    let tools = scripted(Script {
        push_ok: false,
        ..Script::default()
    });

    let report = pipeline::run(&tools, &request(base.path())).await;

    assert!(matches!(report.error, Some(PipelineError::Push { .. })));
    assert!(!project_dir(&base).join(".tmp_42").exists());
}

// ── Registry login ──

#[tokio::test]
async fn login_happens_before_push() {
    let base = TempDir::new().unwrap();
    let mut tools = MockTools::new();
    let mut seq = Sequence::new();

    tools.expect_checkout().returning(|spec| {
        fs::write(spec.dest.join("docker-compose.yml"), COMPOSE).unwrap();
        Ok(())
    });
    tools.expect_build().returning(|_, _, _| Ok(()));
    tools.expect_stop().returning(|_| Ok(()));
    tools.expect_start().returning(|_| Ok(()));
    tools
        .expect_login()
        .withf(|registry, user, _| registry == "ghcr.io" && user == "deployer")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _| Ok(()));
    tools
        .expect_push()
        .withf(|image| image == "ghcr.io/acmeco/my-app:v1")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    tools.expect_prune_dangling().returning(|| Ok(()));

    let mut request = request(base.path());
    request.config.registry.user = Some("deployer".to_owned());
    request.registry_password = Some(SecretString::from("hunter2"));

    let report = pipeline::run(&tools, &request).await;

    assert_eq!(report.outcome, RunOutcome::Succeeded);
}

#[tokio::test]
async fn login_without_password_is_fatal() {
    let base = TempDir::new().unwrap();
    let tools = scripted(Script::default());
    let mut request = request(base.path());
    request.config.registry.user = Some("deployer".to_owned());

    let report = pipeline::run(&tools, &request).await;

    assert_eq!(
        failure_message(&report.outcome),
        "publish failed: missing registry password"
    );
}

// ── Soft failures ──

#[tokio::test]
async fn stop_failure_is_a_warning() {
    let base = TempDir::new().unwrap();
    let tools = scripted(Script {
        stop_ok: false,
        ..Script::default()
    });

    let report = pipeline::run(&tools, &request(base.path())).await;

    assert_eq!(report.outcome, RunOutcome::Succeeded);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].starts_with("stop failed"));
}

#[tokio::test]
async fn start_without_descriptor_is_a_warning() {
    let base = TempDir::new().unwrap();
    let tools = scripted(Script::default());
    let mut request = request(base.path());
    request.config.deploy.files = vec![".env.local".to_owned()];

    let report = pipeline::run(&tools, &request).await;

    assert_eq!(report.outcome, RunOutcome::Succeeded);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].starts_with("start skipped: missing stack descriptor"));
}

#[tokio::test]
async fn prune_failure_is_a_warning() {
    let base = TempDir::new().unwrap();
    let tools = scripted(Script {
        prune_ok: false,
        ..Script::default()
    });

    let report = pipeline::run(&tools, &request(base.path())).await;

    assert_eq!(report.outcome, RunOutcome::Succeeded);
    assert_eq!(report.states.last(), Some(&PipelineState::Done));
    assert!(report.warnings[0].starts_with("prune failed"));
}

#[tokio::test]
async fn prune_can_be_disabled() {
    let base = TempDir::new().unwrap();
    let mut tools = MockTools::new();
    tools.expect_checkout().returning(|spec| {
        fs::write(spec.dest.join("docker-compose.yml"), COMPOSE).unwrap();
        Ok(())
    });
    tools.expect_build().returning(|_, _, _| Ok(()));
    tools.expect_stop().returning(|_| Ok(()));
    tools.expect_start().returning(|_| Ok(()));
    tools.expect_push().returning(|_| Ok(()));
    tools.expect_prune_dangling().never();

    let mut request = request(base.path());
    request.config.deploy.prune = false;

    let report = pipeline::run(&tools, &request).await;

    assert_eq!(report.outcome, RunOutcome::Succeeded);
}

// ── Cleanup ──

#[tokio::test]
async fn orphans_from_killed_runs_are_swept() {
    let base = TempDir::new().unwrap();
    let project = project_dir(&base);
    fs::create_dir_all(project.join(".tmp_40")).unwrap();
    fs::create_dir_all(project.join(".tmp_41@tmp")).unwrap();
    fs::write(project.join(".tmp_40/leftover"), "x").unwrap();
    let tools = scripted(Script {
        build_ok: false,
        ..Script::default()
    });

    let report = pipeline::run(&tools, &request(base.path())).await;

    assert!(report.is_failure());
    assert!(!project.join(".tmp_40").exists());
    assert!(!project.join(".tmp_41@tmp").exists());
    assert_eq!(report.cleanup.removed.len(), 3);
}

#[tokio::test]
async fn previously_promoted_artifacts_survive_a_partial_promotion() {
    let base = TempDir::new().unwrap();
    let project = project_dir(&base);
    fs::create_dir_all(&project).unwrap();
    fs::write(project.join("credentials.json"), "{\"old\":true}").unwrap();
    fs::write(project.join("notes.txt"), "keep me").unwrap();
    let tools = scripted(Script::default());

    let report = pipeline::run(&tools, &request(base.path())).await;

    assert_eq!(report.outcome, RunOutcome::Succeeded);
    assert_eq!(
        fs::read_to_string(project.join("credentials.json")).unwrap(),
        "{\"old\":true}"
    );
    assert_eq!(
        fs::read_to_string(project.join("notes.txt")).unwrap(),
        "keep me"
    );
}

// ── Report ──

#[tokio::test]
async fn report_serializes_outcome_with_status_tag() {
    let base = TempDir::new().unwrap();
    let tools = MockTools::new();
    let mut request = request(base.path());
    request.branch = "feature-x".to_owned();

    let report = pipeline::run(&tools, &request).await;
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["outcome"]["status"], "skipped");
    assert_eq!(json["outcome"]["branch"], "feature-x");
    assert_eq!(json["states"][1], "skipped");
    assert!(json.get("error").is_none());
}
