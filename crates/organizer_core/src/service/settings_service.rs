//! Application settings (theme preference).

use crate::model::settings::{AppSettings, Theme};
use crate::store::keys;
use crate::store::{JsonStore, KeyValueStore, StoreResult};
use log::info;

pub struct SettingsService<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> SettingsService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn settings(&self) -> StoreResult<AppSettings> {
        self.store.load_json(keys::APP_SETTINGS, AppSettings::default())
    }

    /// Stored preference; `light` when nothing is stored.
    pub fn theme(&self) -> StoreResult<Theme> {
        Ok(self.settings()?.theme)
    }

    pub fn set_theme(&self, theme: Theme) -> StoreResult<()> {
        let mut settings = self.settings()?;
        settings.theme = theme;
        self.store.save_json(keys::APP_SETTINGS, &settings)?;
        info!("event=theme_set module=settings status=ok theme={theme}");
        Ok(())
    }

    /// Theme to render now, resolving `auto` against the system preference.
    pub fn effective_theme(&self, system_prefers_dark: bool) -> StoreResult<Theme> {
        Ok(self.theme()?.resolve(system_prefers_dark))
    }
}
