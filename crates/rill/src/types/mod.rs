//! Type definitions: classes, interfaces, records, enums and the
//! structural descriptors that name them.

pub mod class;
pub mod enums;
pub mod interface;
pub mod record;
pub mod type_desc;

pub use class::{ClassBuilder, ClassDef, FieldDef};
pub use enums::EnumDef;
pub use interface::{InterfaceBuilder, InterfaceDef, MethodSig};
pub use record::RecordDef;
pub use type_desc::{
    AccessLevel, GenericParam, Modifiers, TypeDesc, bind_type_args, k_bound, t_bound, v_bound,
};
