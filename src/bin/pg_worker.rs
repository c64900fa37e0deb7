//! Runs one embedded `PostgreSQL` lifecycle step for the store test cluster.
//!
//! ```text
//! pg_worker <setup|start|stop> <config-path>
//! ```
//!
//! The file at `config-path` holds a serialized `WorkerPayload` with the
//! cluster settings and environment overrides. When launched as root the
//! worker reads its payload, then drops to `nobody` before touching the
//! cluster, since `PostgreSQL` refuses to run with superuser privileges.

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[cfg(unix)]
fn main() -> Result<(), BoxError> {
    lifecycle::run(std::env::args_os().skip(1)).map_err(Into::into)
}

#[cfg(not(unix))]
fn main() -> Result<(), BoxError> {
    Err("pg_worker is only supported on Unix platforms".into())
}

#[cfg(unix)]
mod lifecycle {
    use camino::{Utf8Path, Utf8PathBuf};
    use cap_std::ambient_authority;
    use cap_std::fs_utf8::Dir;
    use nix::unistd::{Uid, User, initgroups, setgid, setuid};
    use pg_embedded_setup_unpriv::worker::{PlainSecret, WorkerPayload};
    use postgresql_embedded::{PostgreSQL, Status};
    use std::ffi::{CString, OsString};
    use std::mem::ManuallyDrop;
    use thiserror::Error;

    const UNPRIVILEGED_USER: &str = "nobody";

    /// Failures of a worker invocation.
    #[derive(Debug, Error)]
    pub enum WorkerError {
        /// The command line is malformed.
        #[error("usage: pg_worker <setup|start|stop> <config-path>: {0}")]
        Usage(String),
        /// The payload file cannot be read.
        #[error("failed to read worker config {path}: {source}")]
        ConfigRead {
            /// Payload path.
            path: Utf8PathBuf,
            /// Read failure.
            #[source]
            source: std::io::Error,
        },
        /// The payload file is not a valid payload.
        #[error("failed to parse worker config: {0}")]
        ConfigParse(#[from] serde_json::Error),
        /// The payload settings do not convert to cluster settings.
        #[error("invalid cluster settings: {0}")]
        Settings(String),
        /// Switching to the unprivileged user failed.
        #[error("failed to drop privileges: {0}")]
        PrivilegeDrop(String),
        /// The async runtime could not be built.
        #[error("runtime init failed: {0}")]
        Runtime(#[source] std::io::Error),
        /// The cluster operation itself failed.
        #[error("postgres {operation} failed: {message}")]
        Postgres {
            /// Operation name.
            operation: &'static str,
            /// Failure description.
            message: String,
        },
    }

    #[derive(Debug, Clone, Copy)]
    enum Operation {
        Setup,
        Start,
        Stop,
    }

    impl Operation {
        fn parse(raw: &str) -> Result<Self, WorkerError> {
            match raw {
                "setup" => Ok(Self::Setup),
                "start" => Ok(Self::Start),
                "stop" => Ok(Self::Stop),
                other => Err(WorkerError::Usage(format!("unknown operation '{other}'"))),
            }
        }

        const fn as_str(self) -> &'static str {
            match self {
                Self::Setup => "setup",
                Self::Start => "start",
                Self::Stop => "stop",
            }
        }
    }

    /// Executes the operation named by the first argument.
    pub fn run(mut args: impl Iterator<Item = OsString>) -> Result<(), WorkerError> {
        let operation = args
            .next()
            .ok_or_else(|| WorkerError::Usage("missing operation".to_owned()))
            .and_then(|arg| Operation::parse(&utf8(arg)?))?;
        let config_path = args
            .next()
            .map(utf8)
            .transpose()?
            .map(Utf8PathBuf::from)
            .ok_or_else(|| WorkerError::Usage("missing config path".to_owned()))?;
        if let Some(extra) = args.next() {
            return Err(WorkerError::Usage(format!(
                "unexpected argument '{}'",
                extra.to_string_lossy()
            )));
        }

        let payload = load_payload(&config_path)?;
        drop_privileges()?;
        let settings = payload
            .settings
            .into_settings()
            .map_err(|err| WorkerError::Settings(err.to_string()))?;
        apply_environment(&payload.environment);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(WorkerError::Runtime)?;
        let mut postgres = PostgreSQL::new(settings);
        runtime.block_on(execute(operation, &mut postgres))?;
        if !matches!(operation, Operation::Stop) {
            // The server must outlive this process.
            let _running = ManuallyDrop::new(postgres);
        }
        Ok(())
    }

    async fn execute(operation: Operation, postgres: &mut PostgreSQL) -> Result<(), WorkerError> {
        let failed = |err: postgresql_embedded::Error| WorkerError::Postgres {
            operation: operation.as_str(),
            message: err.to_string(),
        };
        match operation {
            Operation::Setup => {
                postgres.setup().await.map_err(failed)?;
                ensure_started(postgres).await.map_err(failed)
            }
            Operation::Start => ensure_started(postgres).await.map_err(failed),
            Operation::Stop => postgres.stop().await.map_err(failed),
        }
    }

    async fn ensure_started(postgres: &mut PostgreSQL) -> Result<(), postgresql_embedded::Error> {
        if matches!(postgres.status(), Status::Started) {
            return Ok(());
        }
        postgres.start().await
    }

    fn utf8(arg: OsString) -> Result<String, WorkerError> {
        arg.into_string().map_err(|raw| {
            WorkerError::Usage(format!("argument '{}' is not UTF-8", raw.to_string_lossy()))
        })
    }

    fn load_payload(path: &Utf8Path) -> Result<WorkerPayload, WorkerError> {
        let read_failed = |source: std::io::Error| WorkerError::ConfigRead {
            path: path.to_owned(),
            source,
        };
        let file_name = path
            .file_name()
            .ok_or_else(|| WorkerError::Usage(format!("'{path}' does not name a file")))?;
        let parent = path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(read_failed)?;
        let bytes = dir.read(file_name).map_err(read_failed)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn drop_privileges() -> Result<(), WorkerError> {
        if !Uid::effective().is_root() {
            return Ok(());
        }

        let denied = |err: nix::Error| WorkerError::PrivilegeDrop(err.to_string());
        let user = User::from_name(UNPRIVILEGED_USER)
            .map_err(denied)?
            .ok_or_else(|| {
                WorkerError::PrivilegeDrop(format!("user '{UNPRIVILEGED_USER}' not found"))
            })?;
        let user_name = CString::new(user.name.as_str())
            .map_err(|err| WorkerError::PrivilegeDrop(err.to_string()))?;
        initgroups(&user_name, user.gid).map_err(denied)?;
        setgid(user.gid).map_err(denied)?;
        setuid(user.uid).map_err(denied)?;

        // SAFETY: no other thread exists yet; the runtime is built afterwards.
        unsafe {
            std::env::set_var("HOME", &user.dir);
            std::env::set_var("USER", &user.name);
            std::env::set_var("LOGNAME", &user.name);
        }
        Ok(())
    }

    fn apply_environment(environment: &[(String, Option<PlainSecret>)]) {
        for (key, value) in environment {
            // SAFETY: no other thread exists yet; the runtime is built afterwards.
            unsafe {
                match value {
                    Some(secret) => std::env::set_var(key, secret.expose()),
                    None => std::env::remove_var(key),
                }
            }
        }
    }

}
