//! Command handlers.
//!
//! [`App`] executes a parsed [`Command`] and writes its output to any
//! [`Write`], so handlers can be driven from tests with an in-memory store.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::commands::{
    AddCommand, ClearCommand, ConfigCommand, DistanceCommand, ListCommand, OutputFormat,
    RemoveCommand, ShowCommand,
};
use super::{render, Command};
use crate::config::Config;
use crate::distance::Distance;
use crate::error::Error;
use crate::event::EventDraft;
use crate::geo::GeoPoint;
use crate::geocode::GeocoderChain;
use crate::position::{locate_user, provider_for};
use crate::proximity::{locate_event, rank_by_distance, resolve_coordinates};
use crate::store::EventStore;
use crate::tips;

/// Everything a command needs: configuration, storage and geocoding.
///
/// The event store is opened on first use, so commands that never touch
/// it (`tips`, `distance`, `config`) do not create a database.
#[derive(Debug)]
pub struct App {
    config: Config,
    config_path: PathBuf,
    store: OnceCell<EventStore>,
    geocoder: GeocoderChain,
}

impl App {
    /// Build the application from a loaded configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let geocoder = GeocoderChain::from_config(&config.geocoding);
        Self {
            config,
            config_path: Config::default_config_path(),
            store: OnceCell::new(),
            geocoder,
        }
    }

    /// Report `path` as the configuration file in use.
    #[must_use]
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = path;
        self
    }

    /// Use `store` instead of opening the configured backend.
    #[must_use]
    pub fn with_store(mut self, store: EventStore) -> Self {
        self.store = OnceCell::new_with(Some(store));
        self
    }

    /// Execute one command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails; storage write failures are
    /// always reported.
    pub async fn run(&self, command: Command, out: &mut dyn Write) -> Result<()> {
        match command {
            Command::Add(cmd) => self.add(cmd, out).await,
            Command::List(cmd) => self.list(cmd, out).await,
            Command::Show(cmd) => self.show(cmd, out).await,
            Command::Remove(cmd) => self.remove(cmd, out).await,
            Command::Clear(cmd) => self.clear(cmd, out).await,
            Command::Distance(cmd) => self.distance(&cmd, out),
            Command::Tips => print_tips(out),
            Command::Config(cmd) => self.config_command(cmd, out),
        }
    }

    async fn store(&self) -> Result<&EventStore> {
        self.store
            .get_or_try_init(|| async { EventStore::from_config(&self.config) })
            .await
            .context("failed to open event storage")
    }

    async fn user_position(&self, explicit: Option<GeoPoint>) -> Result<Option<GeoPoint>> {
        let provider = provider_for(explicit, &self.config.position)?;
        Ok(locate_user(provider.as_ref()).await)
    }

    async fn add(&self, cmd: AddCommand, out: &mut dyn Write) -> Result<()> {
        let draft = EventDraft::new(cmd.location, cmd.duration, cmd.damages)?;

        let draft = match cmd.at {
            Some(point) => draft.with_coordinates(point)?,
            None => match draft.clone().locate(&self.geocoder).await {
                Ok(located) => located,
                Err(Error::GeocodeNotFound { address }) if cmd.unlocated => {
                    warn!(%address, "Location not found; recording without coordinates");
                    draft
                }
                Err(Error::GeocodeNotFound { address }) => bail!(
                    "could not find '{address}'. Check the address, give coordinates \
                     with --at LAT,LON, or record it anyway with --unlocated"
                ),
                Err(e) => return Err(e.into()),
            },
        };

        let event = draft.into_event();
        let id = event.id.clone();
        self.store()
            .await?
            .add(event)
            .await
            .context("failed to save the event")?;

        writeln!(out, "{id}")?;
        Ok(())
    }

    async fn list(&self, cmd: ListCommand, out: &mut dyn Write) -> Result<()> {
        let events = self.store().await?.load().await;
        let events = resolve_coordinates(events, &self.geocoder).await;
        let user = self.user_position(cmd.from).await?;
        let ranked = rank_by_distance(events, user);
        debug!(count = ranked.len(), ranked = user.is_some(), "Listing events");

        let display = &self.config.display;
        match cmd.format {
            OutputFormat::Json => writeln!(out, "{}", render::json(&ranked)?)?,
            _ if ranked.is_empty() => writeln!(out, "No outage events recorded.")?,
            OutputFormat::Plain => write!(out, "{}", render::plain(&ranked, display))?,
            OutputFormat::Table => write!(out, "{}", render::table(&ranked, display))?,
        }
        Ok(())
    }

    async fn show(&self, cmd: ShowCommand, out: &mut dyn Write) -> Result<()> {
        let Some(event) = self.store().await?.get(&cmd.id).await else {
            bail!("no event with id {}", cmd.id);
        };

        let user = self.user_position(cmd.from).await?;
        let nearby = locate_event(event, user, &self.geocoder).await;

        if cmd.json {
            writeln!(out, "{}", render::json_detail(&nearby)?)?;
        } else {
            write!(out, "{}", render::detail(&nearby, &self.config.display))?;
        }
        Ok(())
    }

    async fn remove(&self, cmd: RemoveCommand, out: &mut dyn Write) -> Result<()> {
        let removed = self
            .store()
            .await?
            .remove(&cmd.id)
            .await
            .context("failed to remove the event")?;

        if removed == 0 {
            writeln!(out, "No event with id {}", cmd.id)?;
        } else {
            writeln!(out, "Removed event {}", cmd.id)?;
        }
        Ok(())
    }

    async fn clear(&self, cmd: ClearCommand, out: &mut dyn Write) -> Result<()> {
        if !cmd.yes {
            writeln!(out, "This will delete every recorded outage event.")?;
            writeln!(out, "Use --yes to confirm.")?;
            return Ok(());
        }

        self.store()
            .await?
            .clear()
            .await
            .context("failed to clear events")?;
        writeln!(out, "All events cleared.")?;
        Ok(())
    }

    fn distance(&self, cmd: &DistanceCommand, out: &mut dyn Write) -> Result<()> {
        let display = &self.config.display;
        let distance = Distance::between(Some(cmd.from), Some(cmd.to));
        writeln!(
            out,
            "{}",
            distance.format(display.distance_precision, &display.unknown_distance)
        )?;
        Ok(())
    }

    fn config_command(&self, cmd: ConfigCommand, out: &mut dyn Write) -> Result<()> {
        match cmd {
            ConfigCommand::Show { json } => {
                if json {
                    writeln!(out, "{}", serde_json::to_string_pretty(&self.config)?)?;
                } else {
                    self.print_config(out)?;
                }
            }
            ConfigCommand::Path => {
                writeln!(out, "{}", self.config_path.display())?;
            }
            ConfigCommand::Validate { file } => {
                let path = file.unwrap_or_else(|| self.config_path.clone());
                writeln!(out, "Validating configuration: {}", path.display())?;
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("cannot read {}", path.display()))?;
                Config::from_toml_str(&text).context("configuration is invalid")?;
                writeln!(out, "Configuration is valid.")?;
            }
        }
        Ok(())
    }

    fn print_config(&self, out: &mut dyn Write) -> Result<()> {
        let config = &self.config;
        writeln!(out, "Current Configuration")?;
        writeln!(out, "=====================")?;
        writeln!(out)?;
        writeln!(out, "[Storage]")?;
        writeln!(out, "  Backend:            {}", config.storage.backend)?;
        writeln!(out, "  Database path:      {}", config.database_path().display())?;
        writeln!(out, "  Slot directory:     {}", config.slot_directory().display())?;
        writeln!(out, "  Slot key:           {}", config.storage.slot_key)?;
        writeln!(out)?;
        writeln!(out, "[Display]")?;
        writeln!(out, "  Distance precision: {}", config.display.distance_precision)?;
        writeln!(out, "  Unknown distance:   {}", config.display.unknown_distance)?;
        writeln!(out, "  Label width:        {}", config.display.label_width)?;
        writeln!(out, "  Summary width:      {}", config.display.summary_width)?;
        writeln!(out)?;
        writeln!(out, "[Geocoding]")?;
        writeln!(out, "  Known places:       {}", config.geocoding.places.len())?;
        writeln!(out, "  Accept coordinates: {}", config.geocoding.accept_coordinates)?;
        writeln!(out)?;
        writeln!(out, "[Position]")?;
        match config.position.point() {
            Some(point) => writeln!(out, "  Fixed position:     {point}")?,
            None => writeln!(out, "  Fixed position:     not set")?,
        }
        Ok(())
    }
}

fn print_tips(out: &mut dyn Write) -> Result<()> {
    for (i, section) in tips::sections().iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        write!(out, "{section}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use clap::Parser;

    use super::*;
    use crate::cli::Cli;
    use crate::config::PlaceConfig;
    use crate::event::{EventId, OutageEvent};
    use crate::storage::MemoryStore;

    const SLOT: &str = "outage_events";

    fn test_config() -> Config {
        let mut config = Config::default();
        config.geocoding.places = vec![
            PlaceConfig {
                name: "Praça da Sé".to_string(),
                latitude: -23.5503,
                longitude: -46.6339,
            },
            PlaceConfig {
                name: "Copacabana".to_string(),
                latitude: -22.9711,
                longitude: -43.1822,
            },
        ];
        config
    }

    fn app() -> (Arc<MemoryStore>, App) {
        let backend = Arc::new(MemoryStore::new());
        let store = EventStore::new(backend.clone(), SLOT);
        (backend, App::new(test_config()).with_store(store))
    }

    async fn run(app: &App, args: &[&str]) -> Result<String> {
        let mut argv = vec!["outagelog"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv)?;
        let mut out = Vec::new();
        app.run(cli.command, &mut out).await?;
        Ok(String::from_utf8(out)?)
    }

    fn stored(backend: &MemoryStore) -> Vec<OutageEvent> {
        backend
            .raw(SLOT)
            .map(|raw| serde_json::from_str(&raw).unwrap())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_add_geocodes_location() {
        let (backend, app) = app();
        let out = run(
            &app,
            &["add", "-l", "praça da  sé", "-d", "3 horas", "--damages", "TV"],
        )
        .await
        .unwrap();

        let events = stored(&backend);
        assert_eq!(events.len(), 1);
        assert_eq!(out.trim(), events[0].id.as_str());
        assert_eq!(events[0].location, "praça da  sé");
        assert!(events[0].has_coordinates());
    }

    #[tokio::test]
    async fn test_add_with_explicit_coordinates() {
        let (backend, app) = app();
        run(
            &app,
            &["add", "-l", "Sítio", "-d", "1 dia", "--damages", "Bomba d'água", "--at", "-23.1,-46.2"],
        )
        .await
        .unwrap();

        let events = stored(&backend);
        assert_eq!(events[0].coordinates(), Some(GeoPoint::new(-23.1, -46.2)));
    }

    #[tokio::test]
    async fn test_add_unknown_location_is_rejected() {
        let (backend, app) = app();
        let err = run(&app, &["add", "-l", "Atlantis", "-d", "1h", "--damages", "x"])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("could not find 'Atlantis'"));
        assert!(backend.raw(SLOT).is_none());
    }

    #[tokio::test]
    async fn test_add_unlocated() {
        let (backend, app) = app();
        run(
            &app,
            &["add", "-l", "Atlantis", "-d", "1h", "--damages", "x", "--unlocated"],
        )
        .await
        .unwrap();

        let events = stored(&backend);
        assert_eq!(events.len(), 1);
        assert!(!events[0].has_coordinates());
    }

    #[tokio::test]
    async fn test_add_blank_field_is_rejected() {
        let (backend, app) = app();
        let err = run(&app, &["add", "-l", "Sé", "-d", "   ", "--damages", "x"])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("outage duration"));
        assert!(backend.raw(SLOT).is_none());
    }

    #[tokio::test]
    async fn test_add_write_failure_is_reported() {
        let (backend, app) = app();
        backend.set_fail_writes(true);
        let err = run(&app, &["add", "-l", "Copacabana", "-d", "2h", "--damages", "x"])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to save the event"));
    }

    #[tokio::test]
    async fn test_list_ranks_from_position() {
        let (_, app) = app();
        run(&app, &["add", "-l", "Copacabana", "-d", "2h", "--damages", "a"])
            .await
            .unwrap();
        run(&app, &["add", "-l", "Praça da Sé", "-d", "3h", "--damages", "b"])
            .await
            .unwrap();

        let out = run(&app, &["list", "--format", "plain", "--from", "-23.55,-46.63"])
            .await
            .unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Praça da Sé"));
        assert!(lines[1].contains("Copacabana"));
        assert!(!out.contains("— km"));
    }

    #[tokio::test]
    async fn test_list_without_position_shows_unknown_distance() {
        let (_, app) = app();
        run(&app, &["add", "-l", "Copacabana", "-d", "2h", "--damages", "a"])
            .await
            .unwrap();

        let out = run(&app, &["list"]).await.unwrap();
        assert!(out.starts_with("ID"));
        assert!(out.contains("— km"));
    }

    #[tokio::test]
    async fn test_list_empty() {
        let (_, app) = app();
        let out = run(&app, &["list"]).await.unwrap();
        assert_eq!(out, "No outage events recorded.\n");

        let out = run(&app, &["list", "--format", "json"]).await.unwrap();
        assert_eq!(out.trim(), "[]");
    }

    #[tokio::test]
    async fn test_list_corrupt_storage_shows_empty() {
        let (backend, app) = app();
        backend.insert_raw(SLOT, "garbage");
        let out = run(&app, &["list"]).await.unwrap();
        assert_eq!(out, "No outage events recorded.\n");
    }

    fn unplaced(id: &str, location: &str) -> String {
        let event = OutageEvent::new(
            EventId::new(id),
            location,
            "2h",
            "x",
            "2024-06-20T16:13:20.000Z",
            None,
        );
        serde_json::to_string(&vec![event]).unwrap()
    }

    #[tokio::test]
    async fn test_list_geocodes_unplaced_events_without_persisting() {
        let (backend, app) = app();
        backend.insert_raw(SLOT, &unplaced("1", "Copacabana"));

        let out = run(&app, &["list", "--format", "json", "--from", "-22.97,-43.18"])
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(value[0]["distanceKm"].is_number());
        assert!(value[0]["latitude"].is_null());
        assert!(value[0]["resolvedCoordinates"]["latitude"].is_number());
        assert!(!stored(&backend)[0].has_coordinates());
    }

    #[tokio::test]
    async fn test_show_and_remove() {
        let (backend, app) = app();
        let id = run(&app, &["add", "-l", "Copacabana", "-d", "2h", "--damages", "Modem"])
            .await
            .unwrap();
        let id = id.trim();

        let out = run(&app, &["show", id, "--from", "-22.9711,-43.1822"])
            .await
            .unwrap();
        assert!(out.contains("Damages:      Modem"));
        assert!(out.contains("Distance:     0.0 km"));

        let out = run(&app, &["remove", id]).await.unwrap();
        assert_eq!(out.trim(), format!("Removed event {id}"));
        let out = run(&app, &["remove", id]).await.unwrap();
        assert_eq!(out.trim(), format!("No event with id {id}"));
        assert!(stored(&backend).is_empty());

        let err = run(&app, &["show", id]).await.unwrap_err();
        assert!(err.to_string().contains("no event with id"));
    }

    #[tokio::test]
    async fn test_show_json() {
        let (backend, app) = app();
        backend.insert_raw(SLOT, &unplaced("7", "Atlantis"));

        let out = run(&app, &["show", "7", "--json"]).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["id"], "7");
        assert!(value["latitude"].is_null());
        assert!(value["distanceKm"].is_null());
        assert!(value.get("resolvedCoordinates").is_none());
    }

    #[tokio::test]
    async fn test_clear_requires_confirmation() {
        let (backend, app) = app();
        run(&app, &["add", "-l", "Copacabana", "-d", "2h", "--damages", "a"])
            .await
            .unwrap();

        let out = run(&app, &["clear"]).await.unwrap();
        assert!(out.contains("--yes"));
        assert_eq!(stored(&backend).len(), 1);

        let out = run(&app, &["clear", "--yes"]).await.unwrap();
        assert_eq!(out.trim(), "All events cleared.");
        assert!(backend.raw(SLOT).is_none());
    }

    #[tokio::test]
    async fn test_distance_command() {
        let (_, app) = app();
        let out = run(&app, &["distance", "0,0", "0,1"]).await.unwrap();
        assert_eq!(out.trim(), "111.2 km");

        assert!(run(&app, &["distance", "0,0", "95,0"]).await.is_err());
    }

    #[tokio::test]
    async fn test_tips_command() {
        let (_, app) = app();
        let out = run(&app, &["tips"]).await.unwrap();
        assert!(out.starts_with("Before the storm\n"));
        assert!(out.contains("\nHealth and safety\n"));
    }

    #[tokio::test]
    async fn test_config_commands() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[display]\nlabel_width = 0\n").unwrap();

        let (_, app) = app();
        let app = app.with_config_path(path.clone());

        let out = run(&app, &["config", "path"]).await.unwrap();
        assert_eq!(out.trim(), path.display().to_string());

        let out = run(&app, &["config", "show"]).await.unwrap();
        assert!(out.contains("Slot key:           outage_events"));
        assert!(out.contains("Known places:       2"));

        let out = run(&app, &["config", "show", "--json"]).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["storage"]["backend"], "sqlite");

        let err = run(&app, &["config", "validate"]).await.unwrap_err();
        assert!(err.to_string().contains("invalid"));

        std::fs::write(&path, "[display]\nlabel_width = 30\n").unwrap();
        let out = run(&app, &["config", "validate"]).await.unwrap();
        assert!(out.ends_with("Configuration is valid.\n"));
    }
}
