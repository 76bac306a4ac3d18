//! The [`StatisticsSink`] trait and its structural implementations.

use crate::evolution::GenerationSnapshot;
use crate::Result;

/// Listener notified once after construction and once after every
/// successful step of an [`Evolution`](crate::evolution::Evolution).
pub trait StatisticsSink<I> {
    /// Records one generation.
    fn on_generation(&mut self, snapshot: &GenerationSnapshot<'_, I>) -> Result<()>;

    /// Flushes or persists whatever was recorded.
    ///
    /// The default implementation does nothing.
    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Discards everything.
impl<I> StatisticsSink<I> for () {
    fn on_generation(&mut self, _snapshot: &GenerationSnapshot<'_, I>) -> Result<()> {
        Ok(())
    }
}

/// Notifies both sinks, `A` first.
impl<I, A, B> StatisticsSink<I> for (A, B)
where
    A: StatisticsSink<I>,
    B: StatisticsSink<I>,
{
    fn on_generation(&mut self, snapshot: &GenerationSnapshot<'_, I>) -> Result<()> {
        self.0.on_generation(snapshot)?;
        self.1.on_generation(snapshot)
    }

    fn finalize(&mut self) -> Result<()> {
        self.0.finalize()?;
        self.1.finalize()
    }
}

impl<I> StatisticsSink<I> for Vec<Box<dyn StatisticsSink<I>>> {
    fn on_generation(&mut self, snapshot: &GenerationSnapshot<'_, I>) -> Result<()> {
        for sink in self.iter_mut() {
            sink.on_generation(snapshot)?;
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        for sink in self.iter_mut() {
            sink.finalize()?;
        }
        Ok(())
    }
}
