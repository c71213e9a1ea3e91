use anyhow::{Result, bail};
use log::{debug, error, info};

use crate::process::{AMPLIFY_GAIN_DB, FRAME_SAMPLES, SAMPLE_RATE, SAMPLES_PER_FRAME};
use crate::utils::aligned::AlignedWorkspace;
use crate::utils::errors::AlcError;
use crate::vendor::AlcBackend;

/// Alignment the level-control work area must keep for its whole lifetime.
pub const ALC_ALIGNMENT: usize = 32;

/// Look-ahead delay of the kernel at 48 kHz, in samples.
pub const ALC_DELAY_48K: i16 = 24;

/// Attack time constant for 48 kHz operation.
pub const ALC_ATTACK_48K: i32 = 0x67d2_ec9b;

/// Release time constant for 48 kHz operation.
pub const ALC_RELEASE_48K: i32 = 0x7fff_7430;

/// Alternate release constant observed in the field; tuning provenance
/// unknown. Not the default.
pub const ALC_RELEASE_48K_ALT: i32 = 0x7AC6_B85A;

/// Parameter record of the level-control kernel.
///
/// Constructed once per stage and never mutated afterwards. Thresholds and
/// time constants are in the kernel's fixed-point encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlcConfig {
    pub sample_rate: u32,
    pub ramp_coef: i16,
    pub ramp_shift: i16,
    pub delay: i16,
    pub attack_time: i32,
    pub release_time: i32,
    pub comp_thresh: i16,
    pub gate_thresh: i16,
    pub gain_db: i32,
}

impl Default for AlcConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            // 0 dB ramp
            ramp_coef: 0,
            ramp_shift: 0,
            delay: ALC_DELAY_48K,
            attack_time: ALC_ATTACK_48K,
            release_time: ALC_RELEASE_48K,
            // 0 dBFS compression threshold
            comp_thresh: 0,
            gate_thresh: 0x8000_u16 as i16,
            gain_db: AMPLIFY_GAIN_DB,
        }
    }
}

/// Streaming level-control stage run over every decoded frame.
///
/// Owns the kernel's aligned work area. Construction queries the required
/// workspace size, allocates it, and runs the kernel's init and
/// set-parameters calls; any failure is captured rather than propagated,
/// leaving the stage uninitialized so that every later [`process`](Self::process)
/// call fails fast.
pub struct AlcStage {
    backend: Box<dyn AlcBackend>,
    workspace: Option<AlignedWorkspace>,
    config: AlcConfig,
    initialized: bool,
}

impl AlcStage {
    pub fn new(backend: Box<dyn AlcBackend>) -> Self {
        Self::with_config(backend, AlcConfig::default())
    }

    pub fn with_config(backend: Box<dyn AlcBackend>, config: AlcConfig) -> Self {
        let mut stage = Self {
            backend,
            workspace: None,
            config,
            initialized: false,
        };
        stage.initialized = stage.try_initialize();
        stage
    }

    fn try_initialize(&mut self) -> bool {
        debug!("level control kernel version {}", self.backend.version());

        let size = self.backend.workspace_size();
        if size <= 0 {
            error!("level control workspace size query returned {size}");
            return false;
        }

        let Some(mut workspace) = AlignedWorkspace::zeroed(size as usize, ALC_ALIGNMENT) else {
            error!("failed to allocate {size} byte level control workspace");
            return false;
        };
        debug!(
            "level control workspace: {} bytes at {:p}",
            workspace.len(),
            workspace.as_ptr()
        );

        let result = self
            .backend
            .init(workspace.as_mut_slice(), SAMPLES_PER_FRAME)
            .and_then(|()| {
                log_config(&self.config);
                self.backend.set_config(workspace.as_mut_slice(), &self.config)
            });

        self.workspace = Some(workspace);
        match result {
            Ok(()) => true,
            Err(err) => {
                error!("level control initialization failed: {err}");
                false
            }
        }
    }

    /// Runs the kernel in place over
    /// `buffer[offset .. offset + FRAME_SAMPLES]`.
    ///
    /// Returns the processed length in bytes, counting from the start of
    /// `buffer`. Fails fast when initialization never succeeded; skipping
    /// the stage is not an option, since output loudness would change.
    pub fn process(&mut self, buffer: &mut [f32], offset: usize) -> Result<usize> {
        if !self.initialized {
            bail!(AlcError::NotInitialized);
        }

        let end = offset
            .checked_add(FRAME_SAMPLES)
            .filter(|&end| end <= buffer.len());
        let Some(end) = end else {
            bail!(AlcError::BadOffset {
                offset,
                len: buffer.len(),
            });
        };

        let Some(workspace) = self.workspace.as_mut() else {
            bail!(AlcError::NotInitialized);
        };
        self.backend
            .process(workspace.as_mut_slice(), &mut buffer[offset..end])?;

        Ok(end * size_of::<f32>())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn config(&self) -> &AlcConfig {
        &self.config
    }
}

fn log_config(config: &AlcConfig) {
    info!("level control parameters");
    info!("  fs: {}", config.sample_rate);
    info!("  ramp_coef: {}", config.ramp_coef);
    info!("  ramp_shift: {}", config.ramp_shift);
    info!("  delay: {}", config.delay);
    info!("  att_time: {:#x}", config.attack_time);
    info!("  rel_time: {:#x}", config.release_time);
    info!("  comp_thresh: {:#x}", config.comp_thresh);
    info!("  gate_thresh: {:#x}", config.gate_thresh);
    info!("  gain: {}", config.gain_db);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendor::mock::MockAlc;

    #[test]
    fn initializes_with_aligned_workspace() {
        let (backend, state) = MockAlc::new();
        let stage = AlcStage::new(Box::new(backend));

        assert!(stage.is_initialized());
        let state = state.borrow();
        assert_eq!(state.inits, 1);
        assert_eq!(state.sets, 1);
        assert!(state.workspace_was_aligned);
        assert_eq!(state.last_config, Some(AlcConfig::default()));
    }

    #[test]
    fn alternate_configuration_reaches_the_kernel() {
        let (backend, state) = MockAlc::new();
        let config = AlcConfig {
            release_time: ALC_RELEASE_48K_ALT,
            ..AlcConfig::default()
        };
        let stage = AlcStage::with_config(Box::new(backend), config);

        assert!(stage.is_initialized());
        assert_eq!(state.borrow().last_config, Some(config));
    }

    #[test]
    fn silence_is_preserved() {
        let (backend, _state) = MockAlc::new();
        let mut stage = AlcStage::new(Box::new(backend));

        let mut buffer = vec![0.0f32; FRAME_SAMPLES];
        let bytes = stage.process(&mut buffer, 0).unwrap();

        assert_eq!(bytes, FRAME_SAMPLES * 4);
        assert!(buffer.iter().all(|&sample| sample == 0.0));
    }

    #[test]
    fn processes_at_offset() {
        let (backend, state) = MockAlc::new();
        state.borrow_mut().gain = 2.0;
        let mut stage = AlcStage::new(Box::new(backend));

        let offset = 8;
        let mut buffer = vec![0.25f32; FRAME_SAMPLES + offset];
        let bytes = stage.process(&mut buffer, offset).unwrap();

        assert_eq!(bytes, (FRAME_SAMPLES + offset) * 4);
        assert!(buffer[..offset].iter().all(|&sample| sample == 0.25));
        assert!(buffer[offset..].iter().all(|&sample| sample == 0.5));
    }

    #[test]
    fn rejects_out_of_range_offset() {
        let (backend, state) = MockAlc::new();
        let mut stage = AlcStage::new(Box::new(backend));

        let mut buffer = vec![0.0f32; FRAME_SAMPLES];
        let err = stage.process(&mut buffer, 1).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AlcError>(),
            Some(AlcError::BadOffset { offset: 1, .. })
        ));
        assert_eq!(state.borrow().processed, 0);
    }

    #[test]
    fn workspace_query_failure_is_captured() {
        let (backend, state) = MockAlc::new();
        state.borrow_mut().workspace_size = 0;
        let mut stage = AlcStage::new(Box::new(backend));

        assert!(!stage.is_initialized());
        let mut buffer = vec![0.0f32; FRAME_SAMPLES];
        let err = stage.process(&mut buffer, 0).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AlcError>(),
            Some(AlcError::NotInitialized)
        ));
    }

    #[test]
    fn kernel_init_failure_leaves_stage_unusable() {
        let (backend, state) = MockAlc::new();
        state.borrow_mut().fail_init = true;
        let mut stage = AlcStage::new(Box::new(backend));

        assert!(!stage.is_initialized());
        assert_eq!(state.borrow().sets, 0);

        let mut buffer = vec![0.0f32; FRAME_SAMPLES];
        assert!(stage.process(&mut buffer, 0).is_err());
        assert_eq!(state.borrow().processed, 0);
    }

    #[test]
    fn set_parameters_failure_leaves_stage_unusable() {
        let (backend, state) = MockAlc::new();
        state.borrow_mut().fail_set = true;
        let stage = AlcStage::new(Box::new(backend));

        assert!(!stage.is_initialized());
        assert_eq!(state.borrow().inits, 1);
    }

    #[test]
    fn kernel_process_errors_propagate() {
        let (backend, state) = MockAlc::new();
        let mut stage = AlcStage::new(Box::new(backend));
        state.borrow_mut().fail_process = true;

        let mut buffer = vec![0.0f32; FRAME_SAMPLES];
        let err = stage.process(&mut buffer, 0).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AlcError>(),
            Some(AlcError::Kernel {
                call: "alc_proc",
                ..
            })
        ));
    }
}
