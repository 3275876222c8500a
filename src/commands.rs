//! CLI Command Handlers
//!
//! Each handler takes CLI args, the loaded config and Output, returns ExitCode.

use ktuvit::api::KtuvitClient;
use ktuvit::{Config, KtuvitError, SearchItem};

use crate::cli::{
    DownloadCmd, DownloadResponse, ExitCode, LoginCmd, Output, ResolveCmd, ResolveResponse,
    SearchCmd, SubtitlesCmd, TitleArgs,
};

/// Build a client from config, or report why not
fn client(config: &Config, sample_limit: Option<usize>, output: &Output) -> Result<KtuvitClient, ExitCode> {
    let cookie = config.login_cookie().ok_or_else(|| {
        output.error(
            "No login cookie. Run `ktuvit login --save` or set KTUVIT_LOGIN_COOKIE",
            ExitCode::InvalidArgs,
        )
    })?;

    let mut options = config.client_options();
    if sample_limit.is_some() {
        options.sample_limit = sample_limit;
    }

    KtuvitClient::with_site(&cookie, config.site(), options)
        .map_err(|e| output.failure("Client setup failed", &e))
}

fn search_item(imdb_id: &str, title: &TitleArgs) -> SearchItem {
    SearchItem {
        name: title.name.clone(),
        imdb_id: Some(imdb_id.to_string()),
        year: title.year.clone(),
        title_type: title.title_type.map(Into::into),
        ..Default::default()
    }
}

/// Resolve or report "not found"
async fn resolve_id(
    client: &KtuvitClient,
    imdb_id: &str,
    title: &TitleArgs,
    output: &Output,
) -> Result<String, ExitCode> {
    output.info(format!("Resolving {}...", imdb_id));
    match client.resolve(&search_item(imdb_id, title)).await {
        Ok(Some(id)) => Ok(id),
        Ok(None) => Err(output.error(
            format!("No Ktuvit title matches {}", imdb_id),
            ExitCode::NotFound,
        )),
        Err(e) => Err(output.failure("Resolve failed", &e)),
    }
}

// =============================================================================
// Login Command
// =============================================================================

pub async fn login_cmd(cmd: LoginCmd, mut config: Config, output: &Output) -> ExitCode {
    output.info(format!("Logging in as {}", cmd.email));

    let cookie = match KtuvitClient::login(&config.site(), &cmd.email, &cmd.hashed_password).await {
        Ok(cookie) => cookie,
        Err(e) => return output.failure("Login failed", &e),
    };

    if cmd.save {
        config.login_cookie = Some(cookie.clone());
        if let Err(e) = config.save() {
            return output.error(format!("Failed to save config: {}", e), ExitCode::Error);
        }
        output.info("Cookie saved");
    }

    if let Err(e) = output.print(serde_json::json!({ "login_cookie": cookie })) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

// =============================================================================
// Resolve Command
// =============================================================================

pub async fn resolve_cmd(cmd: ResolveCmd, config: Config, output: &Output) -> ExitCode {
    let client = match client(&config, None, output) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match resolve_id(&client, &cmd.imdb_id, &cmd.title, output).await {
        Ok(ktuvit_id) => {
            let response = ResolveResponse {
                imdb_id: cmd.imdb_id,
                ktuvit_id,
            };
            if let Err(e) = output.print(&response) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Err(code) => code,
    }
}

// =============================================================================
// Search Command
// =============================================================================

pub async fn search_cmd(cmd: SearchCmd, config: Config, output: &Output) -> ExitCode {
    let client = match client(&config, None, output) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let item = SearchItem {
        name: Some(cmd.query.clone()),
        year: cmd.year,
        title_type: cmd.title_type.map(Into::into),
        with_subs_only: cmd.with_subs_only,
        ..Default::default()
    };

    output.info(format!("Searching for: {}", cmd.query));

    match client.search(&item).await {
        Ok(mut films) => {
            films.truncate(cmd.limit);
            if let Err(e) = output.print(&films) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Err(e) => output.failure("Search failed", &e),
    }
}

// =============================================================================
// Subtitles Command
// =============================================================================

pub async fn subtitles_cmd(cmd: SubtitlesCmd, config: Config, output: &Output) -> ExitCode {
    let client = match client(&config, None, output) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let ktuvit_id = match resolve_id(&client, &cmd.imdb_id, &cmd.title, output).await {
        Ok(id) => id,
        Err(code) => return code,
    };

    let result = match (cmd.season, cmd.episode) {
        (Some(season), Some(episode)) => {
            output.info(format!("Listing S{:02}E{:02}...", season, episode));
            client.subtitles_for_episode(&ktuvit_id, season, episode).await
        }
        _ => client.subtitles_for_movie(&ktuvit_id).await,
    };

    match result {
        Ok(mut subs) => {
            if subs.is_empty() {
                return output.error("No subtitles found", ExitCode::NotFound);
            }
            subs.truncate(cmd.limit);
            if let Err(e) = output.print(&subs) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Err(e) => output.failure("Subtitle listing failed", &e),
    }
}

// =============================================================================
// Download Command
// =============================================================================

pub async fn download_cmd(cmd: DownloadCmd, config: Config, output: &Output) -> ExitCode {
    let client = match client(&config, cmd.sample_limit, output) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let ktuvit_id = match resolve_id(&client, &cmd.imdb_id, &cmd.title, output).await {
        Ok(id) => id,
        Err(code) => return code,
    };

    output.info(format!("Downloading subtitle {}...", cmd.subtitle_id));

    let decoded = match client.download_subtitle(&ktuvit_id, &cmd.subtitle_id).await {
        Ok(decoded) => decoded,
        Err(KtuvitError::Decode { encoding, partial }) if cmd.output.is_none() && !output.json => {
            // Best effort: show what decoded, but still fail
            print!("{}", partial);
            return output.error(
                format!("Subtitle contains invalid {} sequences", encoding),
                ExitCode::BadResponse,
            );
        }
        Err(e) => return output.failure("Download failed", &e),
    };

    match cmd.output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, &decoded.text) {
                return output.error(format!("Failed to write {}: {}", path.display(), e), ExitCode::Error);
            }
            let response = DownloadResponse {
                path,
                encoding: decoded.encoding.to_string(),
                chars: decoded.text.chars().count(),
            };
            if let Err(e) = output.print(&response) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
        }
        None if output.json => {
            if let Err(e) = output.print(&decoded) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
        }
        None => print!("{}", decoded.text),
    }

    ExitCode::Success
}
