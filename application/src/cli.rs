//! Execution of the command-line [`Command`]s.

use std::time::Duration;

use secrecy::SecretBox;
use serde::Serialize;
use service::{
    command::{self, Command as _},
    domain::{
        user::{Password, Role, Username},
        User,
    },
    query,
    State,
};
use tokio::time;
use tracing as log;

use crate::{args::Command, define_error, AsError, Context, Error};

/// Runs the provided [`Command`] within the [`Context`].
///
/// The session is expected to be restored already.
///
/// # Errors
///
/// If the [`Command`] fails.
pub async fn run(ctx: &Context, cmd: Command) -> Result<(), Error> {
    let svc = ctx.service();

    match cmd {
        Command::Login { username, password } => {
            let username = username
                .parse::<Username>()
                .map_err(|_| CliError::InvalidUsername)?;
            let password =
                Password::new(password).ok_or(CliError::InvalidPassword)?;
            let session = svc
                .execute(command::Login {
                    username,
                    password: SecretBox::new(Box::new(password)),
                })
                .await
                .map_err(AsError::into_error)?;
            print_json(&session.user)
        }
        Command::Logout => {
            svc.execute(command::Logout)
                .await
                .map_err(AsError::into_error)?;
            ctx.http().reset().await;
            Ok(())
        }
        Command::Whoami => {
            let user = current_user(ctx).await?;
            print_json(&user)
        }
        Command::HasRole { role } => {
            let has = svc
                .execute(query::HasRole(Role::from(role)))
                .await
                .unwrap_or_else(|e| match e {});
            println!("{has}");
            Ok(())
        }
        Command::HasAnyRole { roles } => {
            let has = svc
                .execute(query::HasAnyRole(
                    roles.into_iter().map(Role::from).collect(),
                ))
                .await
                .unwrap_or_else(|e| match e {});
            println!("{has}");
            Ok(())
        }
        Command::Get { path } => {
            let resource: serde_json::Value = ctx
                .http()
                .client()
                .await
                .map_err(AsError::into_error)?
                .get(&path)
                .await
                .map_err(AsError::into_error)?;
            print_json(&resource)
        }
        Command::Watch { interval } => watch(ctx, interval).await,
    }
}

/// Returns the currently authenticated [`User`].
///
/// # Errors
///
/// If there is no authenticated [`User`].
async fn current_user(ctx: &Context) -> Result<User, Error> {
    ctx.service()
        .execute(query::CurrentUser)
        .await
        .unwrap_or_else(|e| match e {})
        .ok_or_else(|| CliError::NotAuthenticated.into())
}

/// Prints the session [`State`] each time it changes, re-reading the stored
/// session every `interval` (if any).
async fn watch(ctx: &Context, interval: Option<Duration>) -> Result<(), Error> {
    let svc = ctx.service();
    let mut states = svc.subscribe();
    let mut ticks = interval.map(time::interval);

    loop {
        let state = states.borrow_and_update().clone();
        match &state {
            State::Loading => println!("loading"),
            State::Authenticated(user) => match user.expires_at {
                Some(exp) => println!(
                    "authenticated as `{}` until {}",
                    user.username,
                    exp.to_rfc3339(),
                ),
                None => println!("authenticated as `{}`", user.username),
            },
            State::Unauthenticated => println!("unauthenticated"),
        }

        loop {
            let tick = async {
                match ticks.as_mut() {
                    Some(t) => drop(t.tick().await),
                    None => std::future::pending::<()>().await,
                }
            };
            tokio::select! {
                res = states.changed() => {
                    if res.is_err() {
                        return Ok(());
                    }
                    break;
                }
                () = tick => {
                    if let Err(e) = svc.execute(command::RestoreSession).await
                    {
                        log::warn!("failed to re-read the session: {e}");
                    }
                }
            }
        }
    }
}

/// Prints the provided `value` as pretty JSON.
fn print_json(value: &impl Serialize) -> Result<(), Error> {
    let json =
        serde_json::to_string_pretty(value).map_err(AsError::into_error)?;
    println!("{json}");
    Ok(())
}

define_error! {
    enum CliError {
        #[code = "INVALID_USERNAME"]
        #[message = "Invalid username"]
        InvalidUsername,

        #[code = "INVALID_PASSWORD"]
        #[message = "Invalid password"]
        InvalidPassword,

        #[code = "NOT_AUTHENTICATED"]
        #[message = "Not logged in"]
        NotAuthenticated,
    }
}

#[cfg(test)]
mod spec {
    use std::{
        env, fs, process,
        time::{Duration, SystemTime, UNIX_EPOCH},
    };

    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;
    use service::{
        command::{Command as _, RestoreSession},
        State,
    };
    use tokio::{
        io::{AsyncReadExt as _, AsyncWriteExt as _},
        net::TcpListener,
        task::JoinHandle,
    };

    use crate::{args::Command, config, Config, Context};

    use super::run;

    /// Serves the provided `responses`, one per connection, returning the
    /// received requests.
    async fn serve(responses: Vec<String>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut request = Vec::new();
                let mut chunk = [0; 1024];
                loop {
                    let n = socket.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&chunk[..n]);

                    let Some(end) =
                        request.windows(4).position(|w| w == b"\r\n\r\n")
                    else {
                        continue;
                    };
                    let head = String::from_utf8_lossy(&request[..end])
                        .to_lowercase();
                    let len = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .map_or(0, |l| l.trim().parse::<usize>().unwrap());
                    if request.len() >= end + 4 + len {
                        break;
                    }
                }
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
                requests.push(String::from_utf8_lossy(&request).into_owned());
            }
            requests
        });

        (format!("http://{addr}/api"), handle)
    }

    fn response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n{body}",
            body.len(),
        )
    }

    fn token() -> String {
        let exp = (SystemTime::now() + Duration::from_secs(3600))
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        jsonwebtoken::encode(
            &Header::default(),
            &json!({
                "usuario": "mperez",
                "nombre": "María Pérez",
                "roles": ["RRHH"],
                "exp": exp,
            }),
            &EncodingKey::from_secret(b"server-side-secret"),
        )
        .unwrap()
    }

    fn config(base_url: String, name: &str) -> Config {
        Config {
            api: config::Api {
                base_url,
                ..config::Api::default()
            },
            storage: config::Storage {
                path: env::temp_dir()
                    .join(format!("hr-session-{name}-{}.json", process::id())),
            },
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn session_survives_restarts() {
        let token = token();
        let (base_url, server) = serve(vec![
            response("200 OK", &json!({"accessToken": token}).to_string()),
            response("200 OK", r#"[{"nombre": "Analista"}]"#),
            response("204 No Content", ""),
        ])
        .await;
        let config = config(base_url, "restarts");
        let path = config.storage.path.clone();

        let (ctx, _bg) = Context::new(config.clone());
        assert_eq!(ctx.service().execute(RestoreSession).await.unwrap(), None);
        run(
            &ctx,
            Command::Login {
                username: "mperez".into(),
                password: "secreto".into(),
            },
        )
        .await
        .unwrap();
        drop(ctx);

        let (ctx, _bg) = Context::new(config);
        let user = ctx.service().execute(RestoreSession).await.unwrap();
        assert_eq!(user.unwrap().username.to_string(), "mperez");
        run(&ctx, Command::Whoami).await.unwrap();
        run(&ctx, Command::HasRole { role: "RRHH".into() }).await.unwrap();
        run(&ctx, Command::Get { path: "/puestos".into() })
            .await
            .unwrap();
        run(&ctx, Command::Logout).await.unwrap();

        assert_eq!(ctx.service().state(), State::Unauthenticated);
        assert!(!fs::read_to_string(&path).unwrap().contains(&token));
        fs::remove_file(&path).unwrap();

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /api/auth/login "));
        assert!(requests[0].contains(r#""username":"mperez""#));
        assert!(requests[1].starts_with("GET /api/puestos "));
        assert!(requests[1]
            .to_lowercase()
            .contains(&format!("authorization: bearer {token}").to_lowercase()));
        assert!(requests[2].starts_with("POST /api/auth/logout "));
    }

    #[tokio::test]
    async fn reports_server_rejection() {
        let (base_url, server) = serve(vec![response(
            "401 Unauthorized",
            r#"{"mensaje": "Credenciales inválidas"}"#,
        )])
        .await;
        let (ctx, _bg) = Context::new(config(base_url, "rejection"));
        drop(ctx.service().execute(RestoreSession).await.unwrap());

        let err = run(
            &ctx,
            Command::Login {
                username: "mperez".into(),
                password: "incorrecta".into(),
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, "REMOTE_API_ERROR");
        assert_eq!(err.message, "Credenciales inválidas");
        assert_eq!(ctx.service().state(), State::Unauthenticated);
        drop(server.await.unwrap());
    }

    #[tokio::test]
    async fn requires_login_for_whoami() {
        let (ctx, _bg) =
            Context::new(config("http://127.0.0.1:9/api".into(), "whoami"));
        drop(ctx.service().execute(RestoreSession).await.unwrap());

        let err = run(&ctx, Command::Whoami).await.unwrap_err();

        assert_eq!(err.code, "NOT_AUTHENTICATED");
    }
}
