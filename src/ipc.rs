use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
#[serde(tag = "cmd", rename_all = "kebab-case")]
pub enum IpcCommand {
    SelectCity { city: String },
    NextLanguage,
    SetLanguage { lang: String },
    ListCities,
    ReloadConfig,
    GetState,
    Quit,
}

#[derive(Debug, Serialize)]
pub struct CityEntry {
    pub id: String,
    pub abbr: String,
    pub timezone: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct IpcResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    // State fields (only for get-state)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
    // City table (only for list-cities)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cities: Option<Vec<CityEntry>>,
}

impl IpcResponse {
    pub fn ok() -> Self {
        Self {
            ok: true,
            error: None,
            city: None,
            language: None,
            timezone: None,
            offset: None,
            width: None,
            height: None,
            config_path: None,
            cities: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(msg.into()),
            ..Self::ok()
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn state(
        city: &str,
        language: &str,
        timezone: &str,
        offset: &str,
        width: u32,
        height: u32,
        config_path: &str,
    ) -> Self {
        Self {
            city: Some(city.into()),
            language: Some(language.into()),
            timezone: Some(timezone.into()),
            offset: Some(offset.into()),
            width: Some(width),
            height: Some(height),
            config_path: Some(config_path.into()),
            ..Self::ok()
        }
    }

    pub fn with_cities(cities: Vec<CityEntry>) -> Self {
        Self {
            cities: Some(cities),
            ..Self::ok()
        }
    }
}

pub fn socket_path(override_path: Option<&PathBuf>) -> PathBuf {
    if let Some(p) = override_path {
        return p.clone();
    }
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        PathBuf::from(dir).join("chronomap.sock")
    } else {
        let uid = unsafe { libc::getuid() };
        PathBuf::from(format!("/tmp/chronomap-{}.sock", uid))
    }
}

pub fn create_listener(path: &PathBuf) -> Result<UnixListener> {
    // Remove stale socket
    if path.exists() {
        // Check if another instance is running
        if UnixStream::connect(path).is_ok() {
            anyhow::bail!(
                "Another chronomap instance is already running (socket {} is active)",
                path.display()
            );
        }
        std::fs::remove_file(path)?;
    }

    let listener = UnixListener::bind(path)?;
    listener.set_nonblocking(true)?;
    log::info!("IPC listening on {}", path.display());
    Ok(listener)
}

pub fn cleanup_socket(path: &PathBuf) {
    if path.exists() {
        let _ = std::fs::remove_file(path);
        log::info!("Removed socket {}", path.display());
    }
}

pub fn read_command(stream: &UnixStream) -> Result<IpcCommand> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line)?;
    let cmd: IpcCommand = serde_json::from_str(line.trim())?;
    Ok(cmd)
}

pub fn write_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
    let json = serde_json::to_string(response)?;
    stream.write_all(json.as_bytes())?;
    stream.write_all(b"\n")?;
    stream.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_decode_from_kebab_case_json() {
        let cmd: IpcCommand =
            serde_json::from_str(r#"{"cmd": "select-city", "city": "tokyo"}"#).unwrap();
        assert!(matches!(cmd, IpcCommand::SelectCity { city } if city == "tokyo"));

        let cmd: IpcCommand = serde_json::from_str(r#"{"cmd": "next-language"}"#).unwrap();
        assert!(matches!(cmd, IpcCommand::NextLanguage));

        let cmd: IpcCommand =
            serde_json::from_str(r#"{"cmd": "set-language", "lang": "ja-JP"}"#).unwrap();
        assert!(matches!(cmd, IpcCommand::SetLanguage { lang } if lang == "ja-JP"));
    }

    #[test]
    fn unknown_command_is_an_error() {
        assert!(serde_json::from_str::<IpcCommand>(r#"{"cmd": "explode"}"#).is_err());
    }

    #[test]
    fn error_response_serializes_sparsely() {
        let json = serde_json::to_string(&IpcResponse::err("no such city")).unwrap();
        assert_eq!(json, r#"{"ok":false,"error":"no such city"}"#);
    }

    #[test]
    fn state_response_carries_selection() {
        let resp = IpcResponse::state(
            "seoul",
            "ko-KR",
            "Asia/Seoul",
            "GMT+09:00",
            352,
            400,
            "/tmp/config.toml",
        );
        let v: serde_json::Value = serde_json::from_str(&serde_json::to_string(&resp).unwrap()).unwrap();
        assert_eq!(v["city"], "seoul");
        assert_eq!(v["offset"], "GMT+09:00");
        assert!(v.get("cities").is_none());
    }
}
