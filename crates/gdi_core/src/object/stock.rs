//! Stock objects created once when the service starts

use super::{Bitmap, BrushStyle, GdiObject, LogBrush, LogFont, LogPen, ObjectBody, Palette, PenStyle};
use crate::error::{GdiError, GdiResult};
use crate::foundation::color::ColorRef;
use crate::handle::{Handle, HandleTable};

/// Stock object identifiers, numbered like `GetStockObject`
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StockObject {
    /// White solid brush
    WhiteBrush = 0,
    /// Light gray solid brush
    LtGrayBrush = 1,
    /// Gray solid brush
    GrayBrush = 2,
    /// Dark gray solid brush
    DkGrayBrush = 3,
    /// Black solid brush
    BlackBrush = 4,
    /// Brush that paints nothing
    NullBrush = 5,
    /// White pen
    WhitePen = 6,
    /// Black pen
    BlackPen = 7,
    /// Pen that draws nothing
    NullPen = 8,
    /// OEM fixed-pitch font
    OemFixedFont = 10,
    /// ANSI fixed-pitch font
    AnsiFixedFont = 11,
    /// ANSI variable-pitch font
    AnsiVarFont = 12,
    /// System font, selected into new contexts
    SystemFont = 13,
    /// Device default font
    DeviceDefaultFont = 14,
    /// Default palette
    DefaultPalette = 15,
    /// Fixed-pitch system font
    SystemFixedFont = 16,
    /// Default GUI font
    DefaultGuiFont = 17,
    /// Brush whose color follows the context's DC brush color
    DcBrush = 18,
    /// Pen whose color follows the context's DC pen color
    DcPen = 19,
    /// 1x1 monochrome bitmap selected into new memory contexts
    DefaultBitmap = 21,
}

impl StockObject {
    /// Every stock object in creation order
    pub const ALL: [Self; 20] = [
        Self::WhiteBrush,
        Self::LtGrayBrush,
        Self::GrayBrush,
        Self::DkGrayBrush,
        Self::BlackBrush,
        Self::NullBrush,
        Self::WhitePen,
        Self::BlackPen,
        Self::NullPen,
        Self::OemFixedFont,
        Self::AnsiFixedFont,
        Self::AnsiVarFont,
        Self::SystemFont,
        Self::DeviceDefaultFont,
        Self::DefaultPalette,
        Self::SystemFixedFont,
        Self::DefaultGuiFont,
        Self::DcBrush,
        Self::DcPen,
        Self::DefaultBitmap,
    ];

    fn body(self) -> ObjectBody {
        let gray = |level: u8| ObjectBody::Brush(LogBrush::solid(ColorRef::rgb(level, level, level)));
        match self {
            Self::WhiteBrush | Self::DcBrush => gray(0xff),
            Self::LtGrayBrush => gray(0xc0),
            Self::GrayBrush => gray(0x80),
            Self::DkGrayBrush => gray(0x40),
            Self::BlackBrush => gray(0x00),
            Self::NullBrush => ObjectBody::Brush(LogBrush {
                style: BrushStyle::Null,
                color: ColorRef::BLACK,
            }),
            Self::WhitePen => ObjectBody::Pen(LogPen::new(PenStyle::Solid, 0, ColorRef::WHITE)),
            Self::BlackPen | Self::DcPen => ObjectBody::Pen(LogPen::new(PenStyle::Solid, 0, ColorRef::BLACK)),
            Self::NullPen => ObjectBody::Pen(LogPen::new(PenStyle::Null, 0, ColorRef::BLACK)),
            Self::OemFixedFont => ObjectBody::Font(LogFont::new("Terminal", 12).with_fixed_pitch()),
            Self::AnsiFixedFont => ObjectBody::Font(LogFont::new("Courier", 12).with_fixed_pitch()),
            Self::AnsiVarFont => ObjectBody::Font(LogFont::new("MS Sans Serif", 12)),
            Self::SystemFont => ObjectBody::Font(LogFont::default()),
            Self::DeviceDefaultFont => ObjectBody::Font(LogFont::new("", 16)),
            Self::SystemFixedFont => ObjectBody::Font(LogFont::new("Fixedsys", 15).with_fixed_pitch()),
            Self::DefaultGuiFont => ObjectBody::Font(LogFont::new("MS Shell Dlg", -11)),
            Self::DefaultPalette => ObjectBody::Palette(Palette::system_default()),
            Self::DefaultBitmap => ObjectBody::Bitmap(Bitmap::new(1, 1, 1)),
        }
    }
}

/// Handles of the stock objects
#[derive(Debug, Clone)]
pub struct StockObjects {
    handles: Vec<(StockObject, Handle)>,
}

impl StockObjects {
    /// Allocate every stock object as a protected table entry
    pub fn create(table: &mut HandleTable<GdiObject>) -> GdiResult<Self> {
        let mut handles = Vec::with_capacity(StockObject::ALL.len());
        for stock in StockObject::ALL {
            let object = GdiObject::system(stock.body());
            let kind = object.object_type();
            let handle = table.allocate(object, kind).map_err(|_| GdiError::OutOfHandles {
                capacity: table.capacity(),
            })?;
            handles.push((stock, handle));
        }
        log::debug!("Created {} stock objects", handles.len());
        Ok(Self { handles })
    }

    /// Handle of a stock object
    pub fn get(&self, stock: StockObject) -> Handle {
        self.handles
            .iter()
            .find(|(s, _)| *s == stock)
            .map_or(Handle::NULL, |(_, h)| *h)
    }

    /// Stock identity of `handle`, if it is one
    pub fn identify(&self, handle: Handle) -> Option<StockObject> {
        self.handles.iter().find(|(_, h)| *h == handle).map(|(s, _)| *s)
    }

    /// All stock handles
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.handles.iter().map(|(_, h)| *h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::ObjectType;

    #[test]
    fn test_stock_objects_are_protected() {
        let mut table = HandleTable::new(256);
        let stock = StockObjects::create(&mut table).unwrap();
        assert_eq!(table.len(), StockObject::ALL.len());

        let pen = stock.get(StockObject::BlackPen);
        assert_eq!(table.kind(pen), Some(ObjectType::Pen));
        assert!(table.lookup(pen).unwrap().header.system);
        assert_eq!(stock.identify(pen), Some(StockObject::BlackPen));
        assert_eq!(table.kind(stock.get(StockObject::DefaultBitmap)), Some(ObjectType::Bitmap));
    }

    #[test]
    fn test_stock_creation_reports_exhaustion() {
        let mut table = HandleTable::new(usize::from(crate::handle::FIRST_HANDLE_INDEX) + 4);
        assert!(matches!(
            StockObjects::create(&mut table),
            Err(GdiError::OutOfHandles { .. })
        ));
    }
}
