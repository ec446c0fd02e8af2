pub mod profile;
pub mod user;

pub use profile::{
    NewUserAddress, NewUserProfile, NewUserRole, UserAddress, UserAddressChanges, UserProfile,
    UserProfileChanges, UserRole, UserRoleChanges, UserRoleRecord,
};
pub use user::{NewSession, NewUser, Session, SessionChanges, User, UserChanges};
