use {
    crate::{Clock, Level, LogError, RollingSink, RotationConfig},
    std::{
        ffi::OsString,
        path::{Path, PathBuf},
        sync::Arc,
    },
};

/// Maps a level to the sink that persists it.
///
/// The router never filters by severity; that happens in the logger before
/// anything is formatted.
#[derive(Debug)]
pub enum LevelRouter {
    /// Every level goes to one sink at `<base>`.
    Shared(RollingSink),
    /// Each level has its own sink at `<base>.<level>`, indexed by
    /// [`Level::index`].
    Separate(Box<[RollingSink; 6]>),
}

impl LevelRouter {
    /// One sink for all levels.
    pub fn shared(base: &Path, config: RotationConfig, clock: Arc<dyn Clock>) -> Result<Self, LogError> {
        Ok(LevelRouter::Shared(RollingSink::new(base, config, clock)?))
    }

    /// One sink per level. Fails if any of the six sinks cannot be opened.
    pub fn separate(base: &Path, config: RotationConfig, clock: Arc<dyn Clock>) -> Result<Self, LogError> {
        let open = |level: Level| RollingSink::new(level_path(base, level), config.clone(), Arc::clone(&clock));
        Ok(LevelRouter::Separate(Box::new([
            open(Level::Panic)?,
            open(Level::Fatal)?,
            open(Level::Error)?,
            open(Level::Warn)?,
            open(Level::Info)?,
            open(Level::Debug)?,
        ])))
    }

    pub fn route(&self, level: Level) -> &RollingSink {
        match self {
            LevelRouter::Shared(sink) => sink,
            LevelRouter::Separate(sinks) => &sinks[level.index()],
        }
    }

    pub fn is_separate(&self) -> bool {
        matches!(self, LevelRouter::Separate(_))
    }

    /// Every distinct sink, each exactly once.
    pub fn sinks(&self) -> &[RollingSink] {
        match self {
            LevelRouter::Shared(sink) => std::slice::from_ref(sink),
            LevelRouter::Separate(sinks) => sinks.as_slice(),
        }
    }
}

/// `<base>.<level name>`
pub fn level_path(base: &Path, level: Level) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(".");
    name.push(level.name());
    PathBuf::from(name)
}
