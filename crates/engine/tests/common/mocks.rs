use mockall::mock;
use wpred_core::backend::FeedbackSink;
use wpred_core::common::{PathHash, PhysAddr, VirtAddr};
use wpred_core::engine::{BackingStore, Translator};

mock! {
    pub Sink {}
    impl FeedbackSink for Sink {
        fn notify_prediction_outcome(
            &mut self,
            hash: PathHash,
            address_correct: bool,
            data_correct: bool,
        );
    }
}

mock! {
    pub Mmu {}
    impl Translator for Mmu {
        fn translate(&self, vaddr: VirtAddr) -> Option<PhysAddr>;
    }
    impl BackingStore for Mmu {
        fn read(&mut self, paddr: PhysAddr, size: usize) -> Vec<u8>;
        fn write(&mut self, paddr: PhysAddr, data: &[u8]);
    }
}
