use std::sync::{Arc, RwLock};

use futures::task::{Spawn, SpawnExt};

use crate::config::LandingConfig;
use crate::contracts::{FormView, PageSurface, UiEventSource};
use crate::form::{FormController, FormResult, SubmitOutcome, Timer, Transport, write_lock};
use crate::motion::MotionConfig;
use crate::navigation::ScrollNavigator;
use crate::reveal::{Rect, RevealObserver};

/// The landing page's interactive behaviour: the contact form, anchor
/// navigation and scroll reveals, wired to an abstract event source.
#[derive(Clone)]
pub struct LandingPage {
    form: FormController,
    navigator: ScrollNavigator,
    reveal: Arc<RwLock<RevealObserver>>,
    page: Arc<dyn PageSurface>,
    motion: MotionConfig,
    call_master_target: String,
    scroll_on_success: Option<String>,
    reveal_selectors: Vec<String>,
    revealed_class: String,
}

impl LandingPage {
    pub fn new(
        config: &LandingConfig,
        view: Arc<dyn FormView>,
        page: Arc<dyn PageSurface>,
        transport: Arc<dyn Transport>,
        timer: Arc<dyn Timer>,
    ) -> FormResult<Self> {
        let motion = config.motion();
        Ok(Self {
            form: FormController::contact_form(config.form_options(), view, transport, timer)?,
            navigator: ScrollNavigator::new(page.clone()),
            reveal: Arc::new(RwLock::new(RevealObserver::new(
                config.observer_options(),
                motion.level,
            ))),
            page,
            motion,
            call_master_target: config.navigation.call_master_target.clone(),
            scroll_on_success: config.navigation.scroll_on_success.clone(),
            reveal_selectors: config.reveal.selectors.clone(),
            revealed_class: config.reveal.revealed_class.clone(),
        })
    }

    pub fn form(&self) -> &FormController {
        &self.form
    }

    pub fn navigator(&self) -> &ScrollNavigator {
        &self.navigator
    }

    pub fn observe(&self, ids: impl IntoIterator<Item = impl Into<String>>) -> FormResult<()> {
        let mut reveal = write_lock(&self.reveal, "registering reveal targets")?;
        for id in ids {
            reveal.observe(id);
        }
        Ok(())
    }

    /// Reveals every observed element that became visible and returns
    /// their ids.
    pub fn handle_viewport(
        &self,
        viewport: Rect,
        bounds: &[(String, Rect)],
    ) -> FormResult<Vec<String>> {
        let revealed =
            write_lock(&self.reveal, "updating reveal observer")?.update(viewport, bounds);
        let transition = self.motion.effective_reveal();
        for id in &revealed {
            self.page.reveal(id, &transition);
        }
        Ok(revealed)
    }

    /// Stylesheet for the configured reveal targets, honouring the motion
    /// level and the user's reduced-motion preference.
    pub fn reveal_stylesheet(&self) -> String {
        let selectors = self
            .reveal_selectors
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>();
        self.motion
            .reveal_stylesheet(&selectors, &self.revealed_class)
    }

    pub fn call_master(&self) -> bool {
        self.navigator.scroll_to_section(&self.call_master_target)
    }

    /// Full submit interaction: submit, optional scroll on success, then the
    /// auto-hide of the confirmation.
    pub async fn run_submit(&self) -> FormResult<SubmitOutcome> {
        let outcome = self.form.submit().await?;
        if let SubmitOutcome::Delivered { hide, .. } = &outcome {
            if let Some(target) = &self.scroll_on_success {
                self.navigator.scroll_to_section(target);
            }
            self.form.auto_hide(*hide).await?;
        }
        Ok(outcome)
    }

    /// Registers handlers for every page interaction. Submissions run on
    /// `spawner`.
    pub fn install<S>(&self, events: &mut dyn UiEventSource, spawner: S)
    where
        S: Spawn + Clone + 'static,
    {
        let form = self.form.clone();
        events.on_input(Box::new(move |key, value| {
            if let Err(err) = form.input(key, value) {
                tracing::error!(%err, field = %key, "input handling failed");
            }
        }));

        let page = self.clone();
        events.on_submit(Box::new(move || {
            let page = page.clone();
            let spawned = spawner.spawn(async move {
                if let Err(err) = page.run_submit().await {
                    tracing::warn!(%err, "submit interaction failed");
                }
            });
            if let Err(err) = spawned {
                tracing::error!(%err, "failed to spawn submit task");
            }
        }));

        let form = self.form.clone();
        events.on_clear(Box::new(move || {
            if let Err(err) = form.reset() {
                tracing::error!(%err, "form reset failed");
            }
        }));

        let navigator = self.navigator.clone();
        events.on_anchor_click(Box::new(move |href| {
            navigator.follow_anchor(href);
        }));

        let page = self.clone();
        events.on_call_master(Box::new(move || {
            page.call_master();
        }));

        let page = self.clone();
        events.on_viewport_change(Box::new(move |viewport, bounds| {
            if let Err(err) = page.handle_viewport(viewport, bounds) {
                tracing::error!(%err, "viewport update failed");
            }
        }));
    }
}
