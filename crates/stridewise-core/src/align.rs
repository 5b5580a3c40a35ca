///Pitched allocations pad each row so that its length in bytes is a multiple of
///`PITCH_ALIGNMENT`. Accelerators coalesce loads far better when every row
///starts on such a boundary.
///
///The `Align` trait provides methods to calculate the padding needed to reach a
///boundary, and to round a usize up to it.
pub trait Align {
    const PITCH_ALIGNMENT: usize = 128;

    fn calculate_alignment(&self, alignment: usize) -> usize;
    fn align_to(&self, alignment: usize) -> Option<usize>;
}

impl Align for usize {
    fn calculate_alignment(&self, alignment: usize) -> usize {
        let remainder = self % alignment;
        if remainder == 0 {
            0
        } else {
            alignment - remainder
        }
    }

    fn align_to(&self, alignment: usize) -> Option<usize> {
        self.checked_add(self.calculate_alignment(alignment))
    }
}
