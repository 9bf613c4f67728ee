//! Contains the [CalibOpt] Trait for the calibration parameters read by the aggregators.

/// Calibration parameters
pub trait CalibOpt {
    /// Expected TAGH time in the flash ADC window, in ns.
    fn tagh_fadc_mean_time(&self) -> f64;
    /// Expected TAGM time in the flash ADC window, in ns.
    fn tagm_fadc_mean_time(&self) -> f64;
    /// Minimum TAC energy for a hit to be considered.
    fn tac_threshold(&self) -> f64;
    /// Tag of the TAC hit collection to use, empty for the default collection.
    fn tac_rebuild_func(&self) -> &str;
    /// Trigger bits relevant to the TAC.
    fn tac_trigger_mask(&self) -> u32;
    /// Trigger bits relevant to the pair spectrometer.
    fn ps_trigger_mask(&self) -> u32;
}

impl<T> CalibOpt for &T
where
    T: CalibOpt,
{
    fn tagh_fadc_mean_time(&self) -> f64 {
        (*self).tagh_fadc_mean_time()
    }
    fn tagm_fadc_mean_time(&self) -> f64 {
        (*self).tagm_fadc_mean_time()
    }
    fn tac_threshold(&self) -> f64 {
        (*self).tac_threshold()
    }
    fn tac_rebuild_func(&self) -> &str {
        (*self).tac_rebuild_func()
    }
    fn tac_trigger_mask(&self) -> u32 {
        (*self).tac_trigger_mask()
    }
    fn ps_trigger_mask(&self) -> u32 {
        (*self).ps_trigger_mask()
    }
}

impl<T> CalibOpt for std::sync::Arc<T>
where
    T: CalibOpt,
{
    fn tagh_fadc_mean_time(&self) -> f64 {
        (**self).tagh_fadc_mean_time()
    }
    fn tagm_fadc_mean_time(&self) -> f64 {
        (**self).tagm_fadc_mean_time()
    }
    fn tac_threshold(&self) -> f64 {
        (**self).tac_threshold()
    }
    fn tac_rebuild_func(&self) -> &str {
        (**self).tac_rebuild_func()
    }
    fn tac_trigger_mask(&self) -> u32 {
        (**self).tac_trigger_mask()
    }
    fn ps_trigger_mask(&self) -> u32 {
        (**self).ps_trigger_mask()
    }
}
