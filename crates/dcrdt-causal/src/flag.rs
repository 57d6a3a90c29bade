//! Enable-Wins and Disable-Wins Flags
//!
//! A flag is a degenerate kernel whose payloads carry no information: any
//! active dot means "the winning side acted concurrently". The enable-wins
//! flag reads true while dots are active; the disable-wins flag reads
//! false while dots are active.

use crate::context::DotContext;
use crate::embed::Embeddable;
use crate::kernel::DotKernel;
use dcrdt_core::lattice::Lattice;
use serde::{Deserialize, Serialize};

macro_rules! kernel_flag {
    (
        $(#[$doc:meta])*
        $name:ident, $wins:ident, $loses:ident, $active_reads:expr
    ) => {
        $(#[$doc])*
        #[derive(Clone, Debug, Serialize, Deserialize)]
        pub struct $name<K: Ord + Clone> {
            #[serde(skip)]
            id: Option<K>,
            kernel: DotKernel<bool, K>,
        }

        impl<K: Ord + Clone> $name<K> {
            /// Create a mutable replica owned by `id`.
            pub fn new(id: K) -> Self {
                Self {
                    id: Some(id),
                    kernel: DotKernel::new(),
                }
            }

            fn own_id(&self) -> K {
                match &self.id {
                    Some(id) => id.clone(),
                    None => panic!("mutation on an anonymous delta value"),
                }
            }

            /// The causal context.
            pub fn context(&self) -> &DotContext<K> {
                self.kernel.context()
            }

            /// The flag value.
            pub fn read(&self) -> bool {
                if self.kernel.is_empty() {
                    !$active_reads
                } else {
                    $active_reads
                }
            }

            /// Move the flag to the winning side. Replaces the observed
            /// winning dots with a fresh one. Returns the delta.
            pub fn $wins(&mut self) -> Self {
                let id = self.own_id();
                let mut delta = Self::default();
                delta.kernel = self.kernel.remove_value(&$active_reads);
                delta
                    .kernel
                    .join_assign(&self.kernel.add(&id, $active_reads));
                delta
            }

            /// Move the flag to the losing side by withdrawing the observed
            /// winning dots. Returns the delta.
            pub fn $loses(&mut self) -> Self {
                let mut delta = Self::default();
                delta.kernel = self.kernel.remove_value(&$active_reads);
                delta
            }

            /// Remove everything observed. Returns the delta.
            pub fn reset(&mut self) -> Self {
                let mut delta = Self::default();
                delta.kernel = self.kernel.remove_all();
                delta
            }
        }

        impl<K: Ord + Clone> Default for $name<K> {
            fn default() -> Self {
                Self {
                    id: None,
                    kernel: DotKernel::new(),
                }
            }
        }

        impl<K: Ord + Clone> PartialEq for $name<K> {
            fn eq(&self, other: &Self) -> bool {
                self.kernel == other.kernel
            }
        }

        impl<K: Ord + Clone> Eq for $name<K> {}

        impl<K: Ord + Clone> Lattice for $name<K> {
            fn bottom() -> Self {
                Self::default()
            }

            fn join_assign(&mut self, other: &Self) {
                self.kernel.join_assign(&other.kernel);
            }
        }

        impl<K: Ord + Clone> Embeddable<K> for $name<K> {
            fn with_id(id: K) -> Self {
                Self::new(id)
            }

            fn context(&self) -> &DotContext<K> {
                self.kernel.context()
            }

            fn context_mut(&mut self) -> &mut DotContext<K> {
                &mut self.kernel.ctx
            }

            fn reset(&mut self) -> Self {
                $name::reset(self)
            }
        }
    };
}

kernel_flag!(
    /// Enable-wins flag: concurrent enable and disable reads enabled.
    EWFlag,
    enable,
    disable,
    true
);

kernel_flag!(
    /// Disable-wins flag: concurrent disable and enable reads disabled.
    DWFlag,
    disable,
    enable,
    false
);
