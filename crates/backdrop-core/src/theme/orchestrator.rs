//! Theme orchestrator: the single owner of "which backdrop is current".
//!
//! Switching always destroys the outgoing backdrop before the incoming one
//! is constructed, so a surface never has two frame loops or two resize
//! listeners, and the chat style block is swapped in the same call.

use backdrop_hal::{FrameHandle, StyleTarget};

use super::{BuiltinStyles, StyleLoader, ThemeEntry, ThemeRegistry};
use crate::error::BackdropError;
use crate::lifecycle::{Backdrop, FrameOutcome, Host, InstanceId, LifecycleState, RecoveryPolicy, ResizeOutcome};

/// Report of a completed theme switch.
#[derive(Debug)]
pub struct ThemeSwitch {
    pub theme: &'static str,
    pub instance: InstanceId,
    /// `Active`, or `Degraded` if the new scene could not be built.
    pub state: LifecycleState,
    /// The outgoing instance, already destroyed.
    pub retired: Option<Backdrop>,
}

pub struct ThemeOrchestrator<L: StyleLoader = BuiltinStyles> {
    registry: ThemeRegistry,
    styles: L,
    current: &'static str,
    active: Option<Backdrop>,
    typing: bool,
    seed: u64,
    next_instance: u64,
    policy: RecoveryPolicy,
}

impl ThemeOrchestrator<BuiltinStyles> {
    /// Built-in themes and stylesheet links.
    pub fn builtin(seed: u64) -> Self {
        Self::new(ThemeRegistry::builtin(), BuiltinStyles, seed)
    }
}

impl<L: StyleLoader> ThemeOrchestrator<L> {
    pub fn new(registry: ThemeRegistry, styles: L, seed: u64) -> Self {
        let current = registry.default_theme().id;
        Self {
            registry,
            styles,
            current,
            active: None,
            typing: false,
            seed,
            next_instance: 0,
            policy: RecoveryPolicy::default(),
        }
    }

    /// Recovery policy for instances constructed from now on.
    pub fn with_policy(mut self, policy: RecoveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Apply the current theme (the registry default until a switch happens).
    pub fn start<H: Host + StyleTarget>(&mut self, host: &mut H) -> Result<ThemeSwitch, BackdropError> {
        let id = self.current;
        self.switch_theme(host, id)
    }

    /// Tear down the current backdrop and bring up theme `id`.
    ///
    /// Unknown ids and themes without a style definition return
    /// `InvalidThemeSelection` and leave everything untouched.
    pub fn switch_theme<H: Host + StyleTarget>(
        &mut self,
        host: &mut H,
        id: &str,
    ) -> Result<ThemeSwitch, BackdropError> {
        let Some(entry) = self.registry.get(id).copied() else {
            log::warn!("ignoring unknown theme {id:?}");
            return Err(BackdropError::invalid_theme(id, "not registered"));
        };
        let Some(rules) = self.styles.load(&entry) else {
            log::warn!("ignoring theme {id:?}: no style definition for {}", entry.stylesheet);
            return Err(BackdropError::invalid_theme(id, "style definition unavailable"));
        };

        let retired = self.active.take().map(|mut old| {
            old.destroy(host);
            old
        });

        host.apply_style(entry.stylesheet, &rules);
        let backdrop = self.spawn(host, &entry);
        let switch = ThemeSwitch {
            theme: entry.id,
            instance: backdrop.id(),
            state: backdrop.state(),
            retired,
        };

        log::info!(
            "theme {} ({}) -> instance {} {:?}",
            entry.id,
            entry.name,
            switch.instance.0,
            switch.state
        );
        self.current = entry.id;
        self.active = Some(backdrop);
        Ok(switch)
    }

    /// Switch by registry position.
    pub fn select_index<H: Host + StyleTarget>(
        &mut self,
        host: &mut H,
        index: u8,
    ) -> Result<ThemeSwitch, BackdropError> {
        match self.registry.by_index(index) {
            Some(entry) => {
                let id = entry.id;
                self.switch_theme(host, id)
            }
            None => Err(BackdropError::invalid_theme(&format!("#{index}"), "no theme at index")),
        }
    }

    /// Switch to the theme after the current one.
    pub fn toggle_theme<H: Host + StyleTarget>(&mut self, host: &mut H) -> Result<ThemeSwitch, BackdropError> {
        let id = self.registry.next_after(self.current).id;
        self.switch_theme(host, id)
    }

    /// Id of the current theme.
    pub fn current_theme(&self) -> &'static str {
        self.current
    }

    pub fn current_entry(&self) -> Option<&ThemeEntry> {
        self.registry.get(self.current)
    }

    pub fn registry(&self) -> &ThemeRegistry {
        &self.registry
    }

    pub fn active(&self) -> Option<&Backdrop> {
        self.active.as_ref()
    }

    /// Forward the typing signal. Later instances start with the same value.
    pub fn set_typing(&mut self, typing: bool) {
        self.typing = typing;
        if let Some(backdrop) = self.active.as_mut() {
            backdrop.set_typing(typing);
        }
    }

    pub fn typing(&self) -> bool {
        self.typing
    }

    /// Route a frame callback to the current backdrop.
    pub fn on_frame<H: Host>(&mut self, host: &mut H, handle: FrameHandle) -> FrameOutcome {
        match self.active.as_mut() {
            Some(backdrop) => backdrop.on_frame(host, handle),
            None => FrameOutcome::Ignored,
        }
    }

    /// Route a resize event to the current backdrop.
    pub fn on_resize<H: Host>(&mut self, host: &mut H, width: u32, height: u32) -> ResizeOutcome {
        match self.active.as_mut() {
            Some(backdrop) => backdrop.on_resize(host, width, height),
            None => ResizeOutcome::Ignored,
        }
    }

    /// Destroy the current backdrop (page teardown). Returns it for inspection.
    pub fn shutdown<H: Host>(&mut self, host: &mut H) -> Option<Backdrop> {
        self.active.take().map(|mut backdrop| {
            backdrop.destroy(host);
            backdrop
        })
    }

    fn spawn<H: Host>(&mut self, host: &mut H, entry: &ThemeEntry) -> Backdrop {
        let id = InstanceId(self.next_instance);
        self.next_instance += 1;
        let seed = self.seed ^ id.0.wrapping_mul(0x9E37_79B9_7F4A_7C15);

        let mut backdrop = Backdrop::new(id, entry.generator.build(), seed).with_policy(self.policy);
        backdrop.set_typing(self.typing);
        backdrop.start(host);
        backdrop
    }
}
