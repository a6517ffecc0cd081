use quickmodel::core::units::SimLength;
use quickmodel::engine::ensembler::DEFAULT_EXECUTABLE;

pub struct DefaultsConfig {
    pub loopmodel: bool,
    pub package_for_fah: bool,
    pub sim_length: SimLength,
    pub executable: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            loopmodel: true,
            package_for_fah: false,
            sim_length: SimLength::default(),
            executable: DEFAULT_EXECUTABLE.to_string(),
        }
    }
}
