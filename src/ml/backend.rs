/// Compute backend the model runs on.
///
/// `Wgpu` uses the default GPU adapter; `NdArray` runs on the CPU
/// and needs no graphics driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Wgpu,
    NdArray,
}
