mod config;
mod demo_service;
mod logging;

use std::error::Error;

use settings_core::{
    AccountField, AccountForm, FormField, HeaderChannel, HeaderPreview, ProfileForm,
    SubmitOutcome, WindowProperties, languages::storage_key,
};
use settings_platform::{FileStorage, StoredCredentials, current_language, set_current_language};
use tracing::{debug, error, info, warn};

use crate::{
    config::SmokeConfig,
    demo_service::{DemoPicker, DemoSession, InMemoryAccountService},
};

const DEMO_PASSWORD: &str = "hunter2";
const ROTATED_PASSWORD: &str = "correct-horse-battery";
const SETTINGS_PANE_WIDTH: u32 = 640;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init();

    let config = match SmokeConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "invalid configuration");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(config).await {
        error!(error = %err, "settings smoke run failed");
        std::process::exit(1);
    }
}

async fn run(config: SmokeConfig) -> Result<(), Box<dyn Error>> {
    info!(storage = %config.storage_path().display(), "starting settings smoke");
    let storage = FileStorage::new(config.storage_path());

    select_language(&config, &storage)?;

    let window = WindowProperties::new(config.window_width);
    window.set_pane_width(SETTINGS_PANE_WIDTH.min(config.window_width));
    debug!(snapshot = ?window.snapshot(), "window properties ready");

    let header = HeaderChannel::new(32);
    let mut header_rx = header.subscribe();
    let header_task = tokio::spawn(async move {
        let mut preview = HeaderPreview::default();
        while let Ok(event) = header_rx.recv().await {
            preview.apply(&event);
            debug!(?preview, "header preview updated");
        }
        preview
    });

    let service = InMemoryAccountService::new(&config.username, DEMO_PASSWORD);
    let session = DemoSession::new("smoke-socket");
    let credentials = StoredCredentials::new(storage);

    let mut account_form = AccountForm::new(Some(service.account()), header.clone());
    account_form.set(AccountField::Username, format!("{}-renamed", config.username));
    if !account_form.browse_avatar(&DemoPicker) {
        warn!("file picker returned nothing");
    }
    account_form.toggle_change_password();
    account_form.set(AccountField::NewPassword, ROTATED_PASSWORD);
    account_form.set(AccountField::ConfirmNewPassword, ROTATED_PASSWORD);
    account_form.set(AccountField::Password, DEMO_PASSWORD);

    let changed: Vec<&str> = account_form.diff().keys().map(|field| field.name()).collect();
    info!(?changed, can_save = account_form.can_save(), "account form edited");

    let outcome = account_form
        .submit(&service, &credentials, &session)
        .await;
    if outcome != SubmitOutcome::Saved {
        let message = account_form
            .error()
            .map(|err| err.message.clone())
            .unwrap_or_else(|| format!("unexpected outcome {outcome:?}"));
        return Err(message.into());
    }
    info!(
        username = account_form.value(AccountField::Username),
        token_persisted = credentials.token()?.is_some(),
        socket_token = session.token().is_some(),
        "account saved"
    );

    // The server pushes the refreshed account; the form rebases on it.
    if account_form.sync_account(Some(service.account())) {
        debug!(dirty = account_form.can_save(), "account form rebased on pushed account");
    }

    let mut profile_form = ProfileForm::new();
    if !profile_form.refresh(&service, Some(service.account())).await {
        let message = profile_form
            .error()
            .map(|err| err.message.clone())
            .unwrap_or_else(|| "profile details did not load".to_owned());
        return Err(message.into());
    }
    profile_form.set_bio("  Written by the settings smoke driver.  ");
    info!(chars = profile_form.bio_char_count(), "profile bio edited");

    match profile_form.submit(&service).await {
        SubmitOutcome::Saved => info!(bio = profile_form.bio(), "profile saved"),
        other => {
            let message = profile_form
                .error()
                .map(|err| err.message.clone())
                .unwrap_or_else(|| format!("unexpected outcome {other:?}"));
            return Err(message.into());
        }
    }

    account_form.unmount();
    drop(account_form);
    drop(header);

    let preview = header_task.await?;
    info!(
        preview = %serde_json::to_string(&preview)?,
        cleared = preview.is_empty(),
        "settings smoke finished"
    );
    Ok(())
}

fn select_language(config: &SmokeConfig, storage: &FileStorage) -> Result<(), Box<dyn Error>> {
    let registry = config.language_registry();
    if let Some(language) = &config.language {
        set_current_language(storage, &storage_key(language))?;
    }

    let Some(active) = current_language(storage)? else {
        info!("no language selected; using bundled strings");
        return Ok(());
    };
    let name = registry.get(&active).map(|language| language.name.as_str());
    info!(language = %active, ?name, "language selected");

    if config.locales_dir.is_none() {
        debug!("no locales dir configured; skipping translation pack");
        return Ok(());
    }
    match registry.load_pack(&active) {
        Ok(Some(pack)) => {
            let keys = pack.as_object().map_or(0, |entries| entries.len());
            info!(keys, "translation pack loaded");
        }
        Ok(None) => warn!(language = %active, "stored language is not registered"),
        Err(err) => warn!(error = %err, "translation pack unavailable"),
    }
    Ok(())
}
