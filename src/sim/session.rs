//! Session: what the player has selected and is currently playing.
//!
//! Owned by the top-level controller and passed explicitly to whoever needs
//! it. Holds every campaign (or the error that blocks it), the selected
//! campaign, the current level and the running `Gameplay`.

use std::sync::mpsc::Sender;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::{GameConfig, TimingConfig};
use crate::domain::moves::Move;
use crate::error::{PackError, PlayError, TimerError};
use crate::sim::event::{GameEvent, HostTask};
use crate::sim::level::{Campaign, Level, LevelId};
use crate::sim::pack::{embedded_pack, CampaignStore, XmlFileStore};
use crate::sim::play::Gameplay;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SceneId {
    MainMenu,
    CampaignSelect,
    LevelSelect,
    GamePlay,
    LevelCompleted,
    CampaignCompleted,
}

/// Scene transition callback implemented by the front end.
pub trait SceneNavigator {
    fn change_scene(&mut self, scene: SceneId);
}

pub struct CampaignSlot {
    name: String,
    store: Box<dyn CampaignStore>,
    campaign: Result<Campaign, String>,
}

impl CampaignSlot {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The loaded campaign, or the load error that blocks it.
    pub fn campaign(&self) -> Result<&Campaign, &str> {
        self.campaign.as_ref().map_err(String::as_str)
    }
}

pub struct Session {
    slots: Vec<CampaignSlot>,
    selected: Option<usize>,
    current: Option<LevelId>,
    gameplay: Option<Gameplay>,
    timing: TimingConfig,
    tasks: Sender<HostTask>,
}

impl Session {
    pub fn new(timing: TimingConfig, tasks: Sender<HostTask>) -> Self {
        Session { slots: vec![], selected: None, current: None, gameplay: None, timing, tasks }
    }

    /// Session with every configured campaign loaded from its pack file.
    pub fn from_config(config: &GameConfig, tasks: Sender<HostTask>) -> Self {
        let mut session = Session::new(config.timing.clone(), tasks);
        for name in &config.campaigns {
            let store = XmlFileStore::new(config.campaign_path(name)).with_fallback(embedded_pack(name));
            session.add_campaign(name, Box::new(store));
        }
        session
    }

    pub fn add_campaign(&mut self, name: &str, store: Box<dyn CampaignStore>) {
        let campaign = store.load().map_err(|e| {
            warn!(campaign = name, error = %e, "campaign blocked");
            e.to_string()
        });
        self.slots.push(CampaignSlot { name: name.to_string(), store, campaign });
    }

    pub fn campaigns(&self) -> &[CampaignSlot] {
        &self.slots
    }

    /// Fails for unknown indices and blocked campaigns.
    pub fn select_campaign(&mut self, index: usize) -> bool {
        match self.slots.get(index) {
            Some(slot) if slot.campaign.is_ok() => {
                self.selected = Some(index);
                self.current = None;
                self.gameplay = None;
                true
            }
            _ => false,
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn campaign(&self) -> Option<&Campaign> {
        self.slots.get(self.selected?)?.campaign.as_ref().ok()
    }

    fn campaign_mut(&mut self) -> Option<&mut Campaign> {
        self.slots.get_mut(self.selected?)?.campaign.as_mut().ok()
    }

    /// Select `campaign` and start one of its unlocked levels.
    pub fn start_level(&mut self, campaign: usize, id: LevelId) -> bool {
        if self.selected != Some(campaign) && !self.select_campaign(campaign) {
            return false;
        }
        let timing = self.timing.clone();
        let tasks = self.tasks.clone();
        let Some(c) = self.campaign_mut() else { return false };
        if !c.is_unlocked(id) {
            return false;
        }
        let Some(level) = c.level_mut(id) else { return false };
        let gameplay = Gameplay::start(level, timing, tasks);
        self.current = Some(id);
        self.gameplay = Some(gameplay);
        true
    }

    /// Move on after a completed level: the next one, or the campaign end.
    pub fn advance(&mut self, nav: &mut dyn SceneNavigator) -> Option<LevelId> {
        let next = self.current.and_then(|id| self.campaign()?.level_after(id));
        match (next, self.selected) {
            (Some(id), Some(campaign)) if self.start_level(campaign, id) => {
                nav.change_scene(SceneId::GamePlay);
                Some(id)
            }
            _ => {
                info!("campaign finished");
                self.leave_level();
                nav.change_scene(SceneId::CampaignCompleted);
                None
            }
        }
    }

    pub fn leave_level(&mut self) {
        self.gameplay = None;
    }

    pub fn current_id(&self) -> Option<LevelId> {
        self.current
    }

    pub fn level(&self) -> Option<&Level> {
        self.campaign()?.level(self.current?)
    }

    pub fn gameplay(&self) -> Option<&Gameplay> {
        self.gameplay.as_ref()
    }

    /// The running engine together with the level it plays.
    pub fn play(&mut self) -> Option<(&mut Gameplay, &mut Level)> {
        let id = self.current?;
        let index = self.selected?;
        let gameplay = self.gameplay.as_mut()?;
        let level = self.slots.get_mut(index)?.campaign.as_mut().ok()?.level_mut(id)?;
        Some((gameplay, level))
    }

    pub fn tick(&mut self, dt: Duration) -> Result<Vec<GameEvent>, TimerError<PlayError>> {
        match self.play() {
            Some((g, level)) => g.tick(level, dt),
            None => Ok(vec![]),
        }
    }

    pub fn request_move(&mut self, mv: Move) -> Option<GameEvent> {
        let (g, level) = self.play()?;
        g.request_move(level, mv)
    }

    pub fn undo(&mut self) -> Option<GameEvent> {
        let (g, level) = self.play()?;
        g.undo(level)
    }

    pub fn redo(&mut self) -> Option<GameEvent> {
        let (g, level) = self.play()?;
        g.redo(level)
    }

    pub fn restart(&mut self) {
        if let Some((g, level)) = self.play() {
            g.restart(level);
        }
    }

    pub fn skip_reveal(&mut self) -> Option<GameEvent> {
        self.gameplay.as_mut()?.skip_reveal()
    }

    /// Write every loaded campaign back to its store. Returns the failures.
    pub fn save_all(&self) -> Vec<(String, PackError)> {
        let mut failures = vec![];
        for slot in &self.slots {
            if let Ok(campaign) = &slot.campaign {
                if let Err(e) = slot.store.save(campaign) {
                    warn!(campaign = %slot.name, error = %e, "campaign not saved");
                    failures.push((slot.name.clone(), e));
                }
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::diagram;
    use crate::error::PackResult;
    use crate::sim::play::Phase;
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};

    /// In-memory store; `saved` sees what `save` wrote.
    struct MemoryStore {
        load: Option<Campaign>,
        saved: Arc<Mutex<Vec<Campaign>>>,
    }

    impl CampaignStore for MemoryStore {
        fn load(&self) -> PackResult<Campaign> {
            self.load.clone().ok_or_else(|| PackError::UnexpectedRoot("settings".into()))
        }

        fn save(&self, campaign: &Campaign) -> PackResult<()> {
            self.saved.lock().unwrap().push(campaign.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct Nav(Vec<SceneId>);

    impl SceneNavigator for Nav {
        fn change_scene(&mut self, scene: SceneId) {
            self.0.push(scene);
        }
    }

    fn two_levels() -> Campaign {
        Campaign::new("pair", vec![
            Level::new("1", diagram(&["SF"])).unwrap(),
            Level::new("2", diagram(&["S.F"])).unwrap(),
        ])
    }

    fn session() -> (Session, Arc<Mutex<Vec<Campaign>>>, mpsc::Receiver<HostTask>) {
        let (tx, rx) = mpsc::channel();
        let saved = Arc::new(Mutex::new(vec![]));
        let mut s = Session::new(TimingConfig::default(), tx);
        s.add_campaign("pair", Box::new(MemoryStore { load: Some(two_levels()), saved: saved.clone() }));
        s.add_campaign("broken", Box::new(MemoryStore { load: None, saved: saved.clone() }));
        (s, saved, rx)
    }

    fn solve_first_level(s: &mut Session) {
        assert!(s.start_level(0, LevelId(0)));
        s.skip_reveal();
        s.request_move(Move::Right).unwrap();
        for _ in 0..100 {
            s.tick(Duration::from_millis(16)).unwrap();
        }
    }

    #[test]
    fn blocked_campaign_keeps_its_error() {
        let (mut s, _, _) = session();
        assert_eq!(s.campaigns().len(), 2);
        assert!(s.campaigns()[0].campaign().is_ok());
        let err = s.campaigns()[1].campaign().unwrap_err();
        assert!(err.contains("level-pack"));
        assert!(!s.select_campaign(1));
        assert!(!s.select_campaign(9));
        assert!(s.select_campaign(0));
    }

    #[test]
    fn locked_levels_cannot_start() {
        let (mut s, _, _) = session();
        assert!(!s.start_level(0, LevelId(1)));
        assert!(s.start_level(0, LevelId(0)));
        assert_eq!(s.current_id(), Some(LevelId(0)));
        assert_eq!(s.gameplay().map(Gameplay::phase), Some(Phase::Revealing));
        assert!(!s.start_level(1, LevelId(0)));
    }

    #[test]
    fn completion_unlocks_and_advances() {
        let (mut s, _, rx) = session();
        solve_first_level(&mut s);
        assert!(matches!(rx.try_recv(), Ok(HostTask::LevelCompleted { moves: 1, .. })));
        assert!(s.level().unwrap().is_completed());
        assert!(s.campaign().unwrap().is_unlocked(LevelId(1)));

        let mut nav = Nav::default();
        assert_eq!(s.advance(&mut nav), Some(LevelId(1)));
        assert_eq!(nav.0, vec![SceneId::GamePlay]);
        assert_eq!(s.level().unwrap().number(), "2");
    }

    #[test]
    fn last_level_leads_to_campaign_completed() {
        let (mut s, _, _) = session();
        solve_first_level(&mut s);
        let mut nav = Nav::default();
        s.advance(&mut nav);
        s.skip_reveal();
        s.request_move(Move::Right).unwrap();
        for _ in 0..40 {
            s.tick(Duration::from_millis(16)).unwrap();
        }
        s.request_move(Move::Right).unwrap();
        for _ in 0..40 {
            s.tick(Duration::from_millis(16)).unwrap();
        }
        assert!(s.campaign().unwrap().is_completed());
        assert_eq!(s.advance(&mut nav), None);
        assert_eq!(nav.0.last(), Some(&SceneId::CampaignCompleted));
        assert!(s.gameplay().is_none());
    }

    #[test]
    fn save_all_skips_blocked_campaigns() {
        let (mut s, saved, _) = session();
        solve_first_level(&mut s);
        assert!(s.save_all().is_empty());
        let saved = saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].completed_count(), 1);
    }

    #[test]
    fn no_level_means_no_play() {
        let (mut s, _, _) = session();
        assert!(s.play().is_none());
        assert_eq!(s.request_move(Move::Right), None);
        assert_eq!(s.tick(Duration::from_millis(16)).unwrap(), vec![]);
    }
}
