//! Resource objects stored in the handle table
//!
//! Every table slot holds a [`GdiObject`]: a common [`ObjectHeader`] carrying
//! the selection count and deletion flags, plus a kind-specific [`ObjectBody`].
//! Device contexts that have selected an object are recorded in the header as
//! plain handles so they can be told when the object goes away; the header
//! never keeps them alive.

mod kinds;
mod stock;

pub use kinds::{
    Bitmap, BrushStyle, HatchStyle, LogBrush, LogFont, LogPen, Palette, PaletteEntry, PenStyle, Region,
};
pub use stock::{StockObject, StockObjects};

use std::sync::Arc;

use crate::dc::DeviceContext;
use crate::handle::{Handle, ObjectType};

/// Bookkeeping shared by every resource kind
#[derive(Debug, Clone, Default)]
pub struct ObjectHeader {
    /// Outstanding selections
    pub selcount: u32,
    /// Stock object that refuses deletion
    pub system: bool,
    /// Delete requested while selected
    pub pending_delete: bool,
    /// Context holding every selection of a bitmap, meaningful while `selcount > 0`
    pub selected_in: Handle,
    dc_users: Vec<Handle>,
}

impl ObjectHeader {
    /// Fresh header with no references
    pub fn new() -> Self {
        Self::default()
    }

    /// Header for a protected stock object
    pub fn system() -> Self {
        Self {
            system: true,
            ..Self::default()
        }
    }

    /// Record a device context interested in delete notification
    pub fn add_user(&mut self, hdc: Handle) {
        if !self.dc_users.contains(&hdc) {
            self.dc_users.push(hdc);
        }
    }

    /// Forget a device context; returns whether it was recorded
    pub fn remove_user(&mut self, hdc: Handle) -> bool {
        let before = self.dc_users.len();
        self.dc_users.retain(|&user| user != hdc);
        before != self.dc_users.len()
    }

    /// Device contexts to notify on delete
    pub fn users(&self) -> &[Handle] {
        &self.dc_users
    }

    /// Whether the object should be destroyed now that nothing selects it
    pub fn ready_for_delete(&self) -> bool {
        self.selcount == 0 && self.pending_delete && !self.system
    }
}

/// Kind-specific payload
#[derive(Debug, Clone)]
pub enum ObjectBody {
    /// Pen
    Pen(LogPen),
    /// Brush
    Brush(LogBrush),
    /// Font
    Font(LogFont),
    /// Bitmap
    Bitmap(Bitmap),
    /// Palette
    Palette(Palette),
    /// Region
    Region(Region),
    /// Device context, display or memory
    Dc(Arc<DeviceContext>),
}

impl ObjectBody {
    /// Human readable kind name for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Pen(_) => "pen",
            Self::Brush(_) => "brush",
            Self::Font(_) => "font",
            Self::Bitmap(_) => "bitmap",
            Self::Palette(_) => "palette",
            Self::Region(_) => "region",
            Self::Dc(_) => "device context",
        }
    }
}

/// A handle table entry's payload
#[derive(Debug, Clone)]
pub struct GdiObject {
    /// Common bookkeeping
    pub header: ObjectHeader,
    /// Kind-specific data
    pub body: ObjectBody,
}

impl GdiObject {
    /// Wrap a body with a fresh header
    pub fn new(body: ObjectBody) -> Self {
        Self {
            header: ObjectHeader::new(),
            body,
        }
    }

    /// Wrap a body with a protected header
    pub fn system(body: ObjectBody) -> Self {
        Self {
            header: ObjectHeader::system(),
            body,
        }
    }

    /// Table type tag for this body
    pub fn object_type(&self) -> ObjectType {
        match &self.body {
            ObjectBody::Pen(_) => ObjectType::Pen,
            ObjectBody::Brush(_) => ObjectType::Brush,
            ObjectBody::Font(_) => ObjectType::Font,
            ObjectBody::Bitmap(_) => ObjectType::Bitmap,
            ObjectBody::Palette(_) => ObjectType::Palette,
            ObjectBody::Region(_) => ObjectType::Region,
            ObjectBody::Dc(dc) => dc.object_type(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::color::ColorRef;

    #[test]
    fn test_user_list_has_no_duplicates() {
        let mut header = ObjectHeader::new();
        let hdc = Handle::new(40, 1);
        header.add_user(hdc);
        header.add_user(hdc);
        assert_eq!(header.users(), &[hdc]);
        assert!(header.remove_user(hdc));
        assert!(!header.remove_user(hdc));
    }

    #[test]
    fn test_ready_for_delete() {
        let mut header = ObjectHeader::new();
        header.selcount = 1;
        header.pending_delete = true;
        assert!(!header.ready_for_delete());
        header.selcount = 0;
        assert!(header.ready_for_delete());

        let mut stock = ObjectHeader::system();
        stock.pending_delete = true;
        assert!(!stock.ready_for_delete());
    }

    #[test]
    fn test_object_type_follows_body() {
        let pen = GdiObject::new(ObjectBody::Pen(LogPen::new(PenStyle::Solid, 1, ColorRef::BLACK)));
        assert_eq!(pen.object_type(), ObjectType::Pen);
        let region = GdiObject::system(ObjectBody::Region(Region::empty()));
        assert_eq!(region.object_type(), ObjectType::Region);
        assert!(region.header.system);
    }
}
