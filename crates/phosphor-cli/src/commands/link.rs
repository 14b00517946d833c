use std::path::Path;

use phosphor_core::{ClipboardSink, ServerTarget, SystemClipboard, SystemOpener, UrlOpener};

pub struct LinkCommandConfig<'a> {
    pub config_path: Option<&'a Path>,
    pub name: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub open: bool,
    pub copy: bool,
}

pub fn run(cfg: LinkCommandConfig) {
    let config = super::load_config(cfg.config_path).unwrap_or_else(|e| super::fail(e));
    let target = override_target(config.server, cfg.name, cfg.host, cfg.port);

    println!("Server:    {}", target.name);
    println!("Deep link: {}", target.deep_link());
    println!("Address:   {}", target.address());

    if cfg.open {
        match SystemOpener.open_url(&target.deep_link()) {
            Ok(()) => println!("\nHanded off to the game client."),
            Err(e) => eprintln!("\nWarning: {e}. Add the server manually with the address above."),
        }
    }
    if cfg.copy {
        match SystemClipboard.set_text(&target.address()) {
            Ok(()) => println!("Address copied to the clipboard."),
            Err(e) => eprintln!("Warning: {e}"),
        }
    }
}

fn override_target(
    mut target: ServerTarget,
    name: Option<String>,
    host: Option<String>,
    port: Option<u16>,
) -> ServerTarget {
    if let Some(name) = name {
        target.name = name;
    }
    if let Some(host) = host {
        target.host = host;
    }
    if let Some(port) = port {
        target.port = port;
    }
    target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_replace_each_field() {
        let t = override_target(
            ServerTarget::default(),
            Some("My Server".into()),
            Some("example.net".into()),
            Some(25565),
        );
        assert_eq!(
            t.deep_link(),
            "minecraft://?addExternalServer=My%20Server|example.net:25565"
        );
    }

    #[test]
    fn missing_flags_keep_config_values() {
        let base = ServerTarget::new("Lobby", "play.example.org", 19132);
        let t = override_target(base.clone(), None, None, Some(25565));
        assert_eq!(t.name, base.name);
        assert_eq!(t.host, base.host);
        assert_eq!(t.port, 25565);
    }
}
