use cpu_time::ProcessTime;

#[derive(Debug)]
pub(crate) struct ResourceMeasure {
    start: ProcessTime,
}

impl ResourceMeasure {
    pub(crate) fn new() -> ResourceMeasure {
        ResourceMeasure {
            start: ProcessTime::now(),
        }
    }

    pub fn cpu_time(&self) -> f64 {
        let dur = ProcessTime::now().duration_since(self.start);
        dur.as_secs() as f64 + (dur.subsec_millis() as f64 / 1000.)
    }
}
